use core::fmt;
use serde::{Deserialize, Serialize};

/// Card rank within a color. Offset 0 is the highest plain rank (Ace).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[repr(u8)]
pub enum Rank {
    Ace = 0,
    King = 1,
    Queen = 2,
    Jack = 3,
    Ten = 4,
    Nine = 5,
    Eight = 6,
    Seven = 7,
    Six = 8,
}

impl Rank {
    pub const ORDERED: [Rank; 9] = [
        Rank::Ace,
        Rank::King,
        Rank::Queen,
        Rank::Jack,
        Rank::Ten,
        Rank::Nine,
        Rank::Eight,
        Rank::Seven,
        Rank::Six,
    ];

    pub const fn from_offset(offset: u8) -> Option<Self> {
        match offset {
            0 => Some(Rank::Ace),
            1 => Some(Rank::King),
            2 => Some(Rank::Queen),
            3 => Some(Rank::Jack),
            4 => Some(Rank::Ten),
            5 => Some(Rank::Nine),
            6 => Some(Rank::Eight),
            7 => Some(Rank::Seven),
            8 => Some(Rank::Six),
            _ => None,
        }
    }

    pub const fn offset(self) -> u8 {
        self as u8
    }

    pub const fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Rank::Ace => "A",
            Rank::King => "K",
            Rank::Queen => "Q",
            Rank::Jack => "J",
            Rank::Ten => "10",
            Rank::Nine => "9",
            Rank::Eight => "8",
            Rank::Seven => "7",
            Rank::Six => "6",
        };
        f.write_str(text)
    }
}
