use core::fmt;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Color {
    Diamonds = 0,
    Hearts = 1,
    Spades = 2,
    Clubs = 3,
}

impl Color {
    pub const ALL: [Color; 4] = [Color::Diamonds, Color::Hearts, Color::Spades, Color::Clubs];

    pub const fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Color::Diamonds),
            1 => Some(Color::Hearts),
            2 => Some(Color::Spades),
            3 => Some(Color::Clubs),
            _ => None,
        }
    }

    pub const fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            Color::Diamonds => "D",
            Color::Hearts => "H",
            Color::Spades => "S",
            Color::Clubs => "C",
        };
        f.write_str(symbol)
    }
}
