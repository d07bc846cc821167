use core::fmt;
use core::str::FromStr;
use gwplan_core::model::{Chip, ChipSet, Gameweek};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

use crate::constraints::PlanConstraints;

/// How chips enter the search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChipMode {
    /// No chips are played.
    #[default]
    None,
    /// Only the chips in the caller's plan, exactly where placed.
    Locked,
    /// Planned chips are honoured; remaining chips are placed by the search.
    Auto,
}

impl ChipMode {
    pub const fn label(self) -> &'static str {
        match self {
            ChipMode::None => "none",
            ChipMode::Locked => "locked",
            ChipMode::Auto => "auto",
        }
    }
}

impl fmt::Display for ChipMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ChipMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" | "off" => Ok(ChipMode::None),
            "locked" | "planned" => Ok(ChipMode::Locked),
            "auto" => Ok(ChipMode::Auto),
            other => Err(format!("unknown chip mode '{other}'")),
        }
    }
}

/// Caller-chosen chip placements.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChipPlan(pub BTreeMap<Chip, Gameweek>);

impl ChipPlan {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, chip: Chip, gameweek: Gameweek) -> Self {
        self.0.insert(chip, gameweek);
        self
    }

    pub fn get(&self, chip: Chip) -> Option<Gameweek> {
        self.0.get(&chip).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Chip, Gameweek)> + '_ {
        self.0.iter().map(|(chip, gw)| (*chip, *gw))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChipError {
    #[error("{0} is not available to this manager")]
    NotAvailable(Chip),
    #[error("{chip} planned for {gameweek}, outside the horizon")]
    OutsideHorizon { chip: Chip, gameweek: Gameweek },
    #[error("{first} and {second} both planned for {gameweek}")]
    SameGameweek {
        gameweek: Gameweek,
        first: Chip,
        second: Chip,
    },
    #[error("{chip} is forbidden in {gameweek}")]
    Forbidden { chip: Chip, gameweek: Gameweek },
    #[error("{chip} in {gameweek} clashes with a fixed transfer")]
    FixedTransferClash { chip: Chip, gameweek: Gameweek },
}

impl ChipError {
    /// Conflicts between the chip plan and other constraints.
    pub fn is_constraint_conflict(&self) -> bool {
        matches!(
            self,
            ChipError::Forbidden { .. } | ChipError::FixedTransferClash { .. }
        )
    }
}

/// Chip choices open to the search in one gameweek.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GameweekChips {
    /// Planned chip that must be played here if still held.
    pub forced: Option<Chip>,
    /// Chips the search may try here.
    pub optional: ChipSet,
}

/// Per-gameweek chip options resolved from the mode, plan and constraints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChipSchedule {
    slots: Vec<GameweekChips>,
}

impl ChipSchedule {
    pub fn none(len: usize) -> Self {
        Self {
            slots: vec![GameweekChips::default(); len],
        }
    }

    pub fn resolve(
        mode: ChipMode,
        plan: &ChipPlan,
        available: ChipSet,
        constraints: &PlanConstraints,
        gameweeks: &[Gameweek],
    ) -> Result<Self, ChipError> {
        let mut schedule = Self::none(gameweeks.len());
        if mode == ChipMode::None {
            return Ok(schedule);
        }

        for (chip, gameweek) in plan.iter() {
            if !available.contains(chip) {
                return Err(ChipError::NotAvailable(chip));
            }
            let idx = gameweeks
                .iter()
                .position(|gw| *gw == gameweek)
                .ok_or(ChipError::OutsideHorizon { chip, gameweek })?;
            if !constraints.chip_permitted(chip, gameweek) {
                return Err(ChipError::Forbidden { chip, gameweek });
            }
            if chip.unlimited_transfers() && constraints.has_fixed(gameweek) {
                return Err(ChipError::FixedTransferClash { chip, gameweek });
            }
            if let Some(first) = schedule.slots[idx].forced {
                return Err(ChipError::SameGameweek {
                    gameweek,
                    first,
                    second: chip,
                });
            }
            schedule.slots[idx].forced = Some(chip);
        }

        if mode == ChipMode::Auto {
            let placeable: ChipSet = available
                .iter()
                .filter(|chip| plan.get(*chip).is_none() && constraints.chip_allowed(*chip))
                .collect();
            for (slot, gameweek) in schedule.slots.iter_mut().zip(gameweeks) {
                if slot.forced.is_some() {
                    continue;
                }
                slot.optional = placeable
                    .iter()
                    .filter(|chip| constraints.chip_permitted(*chip, *gameweek))
                    .filter(|chip| !(chip.unlimited_transfers() && constraints.has_fixed(*gameweek)))
                    .collect();
            }
        }
        Ok(schedule)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn at(&self, idx: usize) -> GameweekChips {
        self.slots.get(idx).copied().unwrap_or_default()
    }

    /// Chip choices for a state still holding `remaining`. `None` is always
    /// offered unless a planned chip is due.
    pub fn options(&self, idx: usize, remaining: ChipSet) -> Vec<Option<Chip>> {
        let slot = self.at(idx);
        if let Some(chip) = slot.forced {
            return vec![remaining.contains(chip).then_some(chip)];
        }
        let mut options = vec![None];
        options.extend(slot.optional.intersect(remaining).iter().map(Some));
        options
    }

    /// Only the planned chip, if any. Used once the search budget is spent.
    pub fn forced_options(&self, idx: usize, remaining: ChipSet) -> Vec<Option<Chip>> {
        let forced = self.at(idx).forced.filter(|chip| remaining.contains(*chip));
        vec![forced]
    }

    /// Planned chips keyed by gameweek index.
    pub fn planned(&self) -> impl Iterator<Item = (usize, Chip)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(idx, slot)| slot.forced.map(|chip| (idx, chip)))
    }
}
