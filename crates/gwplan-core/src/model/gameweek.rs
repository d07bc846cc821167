use core::fmt;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::model::player::ClubId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Gameweek(pub u16);

impl fmt::Display for Gameweek {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GW{}", self.0)
    }
}

/// Gameweeks the planner looks across. `upcoming[0]` is the gameweek the next
/// deadline applies to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Horizon {
    pub current: Gameweek,
    pub upcoming: Vec<Gameweek>,
}

impl Horizon {
    pub fn new(current: Gameweek, upcoming: Vec<Gameweek>) -> Self {
        Self { current, upcoming }
    }

    /// Consecutive gameweeks starting at `first`.
    pub fn consecutive(first: Gameweek, len: usize) -> Self {
        let upcoming = (0..len as u16).map(|i| Gameweek(first.0 + i)).collect();
        Self {
            current: first,
            upcoming,
        }
    }

    pub fn is_valid(&self) -> bool {
        !self.upcoming.is_empty()
            && self.upcoming[0] >= self.current
            && self.upcoming.windows(2).all(|pair| pair[0] < pair[1])
    }

    pub fn first(&self) -> Option<Gameweek> {
        self.upcoming.first().copied()
    }

    pub fn len(&self) -> usize {
        self.upcoming.len()
    }

    pub fn is_empty(&self) -> bool {
        self.upcoming.is_empty()
    }

    pub fn contains(&self, gameweek: Gameweek) -> bool {
        self.upcoming.contains(&gameweek)
    }

    pub fn index_of(&self, gameweek: Gameweek) -> Option<usize> {
        self.upcoming.iter().position(|gw| *gw == gameweek)
    }

    pub fn truncated(&self, len: usize) -> Horizon {
        Horizon {
            current: self.current,
            upcoming: self.upcoming.iter().take(len).copied().collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FixtureOutlook {
    Blank,
    Single,
    Double,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DoubleBlank {
    #[serde(default)]
    pub double_teams: BTreeSet<ClubId>,
    #[serde(default)]
    pub blank_teams: BTreeSet<ClubId>,
}

/// Clubs with zero or two fixtures, keyed by gameweek.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FixtureCalendar {
    gameweeks: BTreeMap<Gameweek, DoubleBlank>,
}

impl FixtureCalendar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark_double(&mut self, gameweek: Gameweek, club: ClubId) {
        let entry = self.gameweeks.entry(gameweek).or_default();
        entry.blank_teams.remove(&club);
        entry.double_teams.insert(club);
    }

    pub fn mark_blank(&mut self, gameweek: Gameweek, club: ClubId) {
        let entry = self.gameweeks.entry(gameweek).or_default();
        entry.double_teams.remove(&club);
        entry.blank_teams.insert(club);
    }

    pub fn outlook(&self, club: ClubId, gameweek: Gameweek) -> FixtureOutlook {
        match self.gameweeks.get(&gameweek) {
            Some(entry) if entry.double_teams.contains(&club) => FixtureOutlook::Double,
            Some(entry) if entry.blank_teams.contains(&club) => FixtureOutlook::Blank,
            _ => FixtureOutlook::Single,
        }
    }

    pub fn get(&self, gameweek: Gameweek) -> Option<&DoubleBlank> {
        self.gameweeks.get(&gameweek)
    }

    /// Restrict to the given gameweeks.
    pub fn restricted_to(&self, gameweeks: &[Gameweek]) -> FixtureCalendar {
        FixtureCalendar {
            gameweeks: self
                .gameweeks
                .iter()
                .filter(|(gw, _)| gameweeks.contains(gw))
                .map(|(gw, entry)| (*gw, entry.clone()))
                .collect(),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Gameweek, &DoubleBlank)> {
        self.gameweeks.iter()
    }
}
