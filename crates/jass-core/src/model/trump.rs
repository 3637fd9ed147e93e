use crate::model::color::Color;
use core::fmt;
use serde::{Deserialize, Serialize};

/// The six trump classes, in the order a trump classifier reports them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum Trump {
    Diamonds = 0,
    Hearts = 1,
    Spades = 2,
    Clubs = 3,
    /// No trump color, high cards win.
    ObeAbe = 4,
    /// No trump color, low cards win.
    UneUfe = 5,
}

pub const TRUMP_CLASSES: usize = 6;

impl Trump {
    pub const ALL: [Trump; TRUMP_CLASSES] = [
        Trump::Diamonds,
        Trump::Hearts,
        Trump::Spades,
        Trump::Clubs,
        Trump::ObeAbe,
        Trump::UneUfe,
    ];

    pub const fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Trump::Diamonds),
            1 => Some(Trump::Hearts),
            2 => Some(Trump::Spades),
            3 => Some(Trump::Clubs),
            4 => Some(Trump::ObeAbe),
            5 => Some(Trump::UneUfe),
            _ => None,
        }
    }

    pub const fn from_color(color: Color) -> Self {
        match color {
            Color::Diamonds => Trump::Diamonds,
            Color::Hearts => Trump::Hearts,
            Color::Spades => Trump::Spades,
            Color::Clubs => Trump::Clubs,
        }
    }

    pub const fn index(self) -> usize {
        self as usize
    }

    /// The elevated color, if this class has one.
    pub const fn color(self) -> Option<Color> {
        match self {
            Trump::Diamonds => Some(Color::Diamonds),
            Trump::Hearts => Some(Color::Hearts),
            Trump::Spades => Some(Color::Spades),
            Trump::Clubs => Some(Color::Clubs),
            Trump::ObeAbe | Trump::UneUfe => None,
        }
    }

    pub const fn is_color(self) -> bool {
        self.color().is_some()
    }
}

impl fmt::Display for Trump {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Trump::Diamonds => "Diamonds",
            Trump::Hearts => "Hearts",
            Trump::Spades => "Spades",
            Trump::Clubs => "Clubs",
            Trump::ObeAbe => "Obe-abe",
            Trump::UneUfe => "Une-ufe",
        };
        f.write_str(label)
    }
}

/// What a seat may answer when asked for trump.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrumpChoice {
    Declare(Trump),
    Push,
}

impl fmt::Display for TrumpChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrumpChoice::Declare(trump) => write!(f, "{trump}"),
            TrumpChoice::Push => f.write_str("Push"),
        }
    }
}
