use core::fmt;
use core::str::FromStr;
use serde::{Deserialize, Serialize};

/// One-time strategic boosts; at most one may be active per gameweek.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Chip {
    Wildcard,
    FreeHit,
    BenchBoost,
    TripleCaptain,
}

impl Chip {
    pub const ALL: [Chip; 4] = [
        Chip::Wildcard,
        Chip::FreeHit,
        Chip::BenchBoost,
        Chip::TripleCaptain,
    ];

    const fn bit(self) -> u8 {
        match self {
            Chip::Wildcard => 1,
            Chip::FreeHit => 1 << 1,
            Chip::BenchBoost => 1 << 2,
            Chip::TripleCaptain => 1 << 3,
        }
    }

    /// Wildcard and free hit make every transfer that week free.
    pub const fn unlimited_transfers(self) -> bool {
        matches!(self, Chip::Wildcard | Chip::FreeHit)
    }

    /// Free hit squads are discarded after the gameweek is scored.
    pub const fn persists_squad(self) -> bool {
        !matches!(self, Chip::FreeHit)
    }

    pub const fn captain_multiplier(self) -> u8 {
        match self {
            Chip::TripleCaptain => 3,
            _ => 2,
        }
    }

    pub const fn counts_bench(self) -> bool {
        matches!(self, Chip::BenchBoost)
    }

    pub const fn label(self) -> &'static str {
        match self {
            Chip::Wildcard => "wildcard",
            Chip::FreeHit => "free_hit",
            Chip::BenchBoost => "bench_boost",
            Chip::TripleCaptain => "triple_captain",
        }
    }
}

impl fmt::Display for Chip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Chip {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "wildcard" | "wc" => Ok(Chip::Wildcard),
            "free_hit" | "freehit" | "fh" => Ok(Chip::FreeHit),
            "bench_boost" | "benchboost" | "bb" => Ok(Chip::BenchBoost),
            "triple_captain" | "triplecaptain" | "tc" => Ok(Chip::TripleCaptain),
            other => Err(format!("unknown chip '{other}'")),
        }
    }
}

/// Compact set of chips, serialized as a list of chip names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "Vec<Chip>", into = "Vec<Chip>")]
pub struct ChipSet(u8);

impl ChipSet {
    pub const EMPTY: ChipSet = ChipSet(0);
    pub const ALL: ChipSet = ChipSet(0b1111);

    pub const fn contains(self, chip: Chip) -> bool {
        self.0 & chip.bit() != 0
    }

    pub const fn with(self, chip: Chip) -> ChipSet {
        ChipSet(self.0 | chip.bit())
    }

    pub const fn without(self, chip: Chip) -> ChipSet {
        ChipSet(self.0 & !chip.bit())
    }

    pub const fn intersect(self, other: ChipSet) -> ChipSet {
        ChipSet(self.0 & other.0)
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub const fn bits(self) -> u8 {
        self.0
    }

    pub fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn iter(self) -> impl Iterator<Item = Chip> {
        Chip::ALL.into_iter().filter(move |chip| self.contains(*chip))
    }
}

impl From<Vec<Chip>> for ChipSet {
    fn from(chips: Vec<Chip>) -> Self {
        chips.into_iter().collect()
    }
}

impl From<ChipSet> for Vec<Chip> {
    fn from(set: ChipSet) -> Self {
        set.iter().collect()
    }
}

impl FromIterator<Chip> for ChipSet {
    fn from_iter<T: IntoIterator<Item = Chip>>(iter: T) -> Self {
        iter.into_iter().fold(ChipSet::EMPTY, ChipSet::with)
    }
}
