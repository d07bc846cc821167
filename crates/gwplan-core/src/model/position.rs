use core::fmt;
use core::str::FromStr;
use serde::{Deserialize, Serialize};

pub const SQUAD_SIZE: usize = 15;
pub const STARTERS: usize = 11;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum Position {
    #[serde(alias = "GKP", alias = "gkp")]
    Goalkeeper = 0,
    #[serde(alias = "DEF", alias = "def")]
    Defender = 1,
    #[serde(alias = "MID", alias = "mid")]
    Midfielder = 2,
    #[serde(alias = "FWD", alias = "fwd")]
    Forward = 3,
}

impl Position {
    pub const ALL: [Position; 4] = [
        Position::Goalkeeper,
        Position::Defender,
        Position::Midfielder,
        Position::Forward,
    ];

    /// Upstream element types are 1-based (1 = goalkeeper .. 4 = forward).
    pub const fn from_element_type(element_type: u8) -> Option<Self> {
        match element_type {
            1 => Some(Position::Goalkeeper),
            2 => Some(Position::Defender),
            3 => Some(Position::Midfielder),
            4 => Some(Position::Forward),
            _ => None,
        }
    }

    pub const fn element_type(self) -> u8 {
        self as u8 + 1
    }

    pub const fn index(self) -> usize {
        self as usize
    }

    /// Number of players every squad holds in this position.
    pub const fn squad_quota(self) -> usize {
        match self {
            Position::Goalkeeper => 2,
            Position::Defender => 5,
            Position::Midfielder => 5,
            Position::Forward => 3,
        }
    }

    pub const fn min_starters(self) -> usize {
        match self {
            Position::Goalkeeper => 1,
            Position::Defender => 3,
            Position::Midfielder => 2,
            Position::Forward => 1,
        }
    }

    pub const fn max_starters(self) -> usize {
        match self {
            Position::Goalkeeper => 1,
            Position::Defender => 5,
            Position::Midfielder => 5,
            Position::Forward => 3,
        }
    }

    /// First slot index of this position inside a canonical squad.
    pub const fn squad_offset(self) -> usize {
        match self {
            Position::Goalkeeper => 0,
            Position::Defender => 2,
            Position::Midfielder => 7,
            Position::Forward => 12,
        }
    }

    pub const fn code(self) -> &'static str {
        match self {
            Position::Goalkeeper => "GKP",
            Position::Defender => "DEF",
            Position::Midfielder => "MID",
            Position::Forward => "FWD",
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Position {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "gkp" | "gk" | "goalkeeper" | "1" => Ok(Position::Goalkeeper),
            "def" | "defender" | "2" => Ok(Position::Defender),
            "mid" | "midfielder" | "3" => Ok(Position::Midfielder),
            "fwd" | "fw" | "forward" | "4" => Ok(Position::Forward),
            other => Err(format!("unknown position '{other}'")),
        }
    }
}
