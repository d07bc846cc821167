use gwplan_core::model::{
    Chip, ChipSet, Gameweek, Horizon, Player, PlayerId, Position, Price, Squad, SquadSlot,
};
use gwplan_core::pool::{PlayerPool, PoolFilter};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

/// A transfer the manager has already committed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FixedTransfer {
    pub gameweek: Gameweek,
    pub out: PlayerId,
    #[serde(rename = "in")]
    pub incoming: PlayerId,
}

/// Hard rules every candidate path must respect.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlanConstraints {
    /// Owned players that may never be sold.
    pub locked: BTreeSet<PlayerId>,
    /// Players that may never be bought.
    pub avoided: BTreeSet<PlayerId>,
    /// Cap on paid transfers across the whole horizon.
    pub max_hits: Option<u32>,
    pub chip_forbid: BTreeMap<Chip, BTreeSet<Gameweek>>,
    /// Chips the automatic search may consider; `None` means all owned chips.
    pub chip_allow: Option<ChipSet>,
    pub fixed_transfers: Vec<FixedTransfer>,
    pub pool_filter: PoolFilter,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConstraintError {
    #[error("locked player {0} is not in the squad")]
    LockedNotOwned(PlayerId),
    #[error("player {0} is both locked and avoided")]
    LockedAndAvoided(PlayerId),
    #[error("fixed transfer in {gameweek}: {reason}")]
    FixedTransfer { gameweek: Gameweek, reason: String },
    #[error("{position} slot cannot be filled: {reason}")]
    PositionUnsatisfiable { position: Position, reason: String },
}

impl PlanConstraints {
    /// Check the constraints against the starting squad before any search.
    ///
    /// Fixed transfers are replayed in order so an unaffordable buy or a
    /// club-limit breach fails here instead of emptying the search.
    pub fn validate(
        &self,
        squad: &Squad,
        bank: Price,
        pool: &PlayerPool,
        horizon: &Horizon,
    ) -> Result<(), ConstraintError> {
        for player in &self.locked {
            if !squad.contains(*player) {
                return Err(ConstraintError::LockedNotOwned(*player));
            }
        }
        if let Some(player) = self.locked.intersection(&self.avoided).next() {
            return Err(ConstraintError::LockedAndAvoided(*player));
        }

        let mut owned = squad.clone();
        let mut bank = i64::from(bank);
        let fixed_transfers = self.fixed_in_order();
        for (idx, fixed) in fixed_transfers.iter().enumerate() {
            let gameweek = fixed.gameweek;
            let fail = |reason: String| ConstraintError::FixedTransfer { gameweek, reason };
            if !horizon.contains(gameweek) {
                return Err(fail("gameweek is outside the horizon".to_string()));
            }
            let Some(out) = owned.slot(fixed.out).copied() else {
                return Err(fail(format!("player {} is not owned", fixed.out)));
            };
            if self.locked.contains(&fixed.out) {
                return Err(fail(format!("player {} is locked", fixed.out)));
            }
            if owned.contains(fixed.incoming) {
                return Err(fail(format!("player {} is already owned", fixed.incoming)));
            }
            if self.avoided.contains(&fixed.incoming) {
                return Err(fail(format!("player {} is avoided", fixed.incoming)));
            }
            let incoming = pool
                .get(fixed.incoming)
                .ok_or_else(|| fail(format!("player {} is unknown", fixed.incoming)))?;
            if out.position != incoming.position {
                return Err(ConstraintError::PositionUnsatisfiable {
                    position: out.position,
                    reason: format!(
                        "fixed transfer in {gameweek} brings in a {}",
                        incoming.position
                    ),
                });
            }
            bank += i64::from(out.selling_price) - i64::from(incoming.price);
            let closes_week = fixed_transfers
                .get(idx + 1)
                .is_none_or(|next| next.gameweek != gameweek);
            if closes_week && bank < 0 {
                return Err(fail(format!(
                    "cannot afford player {} ({} short)",
                    fixed.incoming, -bank
                )));
            }
            let slot = SquadSlot {
                player: incoming.id,
                position: incoming.position,
                club: incoming.club,
                selling_price: incoming.price,
            };
            owned = owned
                .apply_transfer(fixed.out, slot)
                .map_err(|err| fail(err.to_string()))?;
        }

        Ok(())
    }

    /// Fixed transfers sorted by gameweek, keeping input order within a week.
    pub fn fixed_in_order(&self) -> Vec<FixedTransfer> {
        let mut fixed = self.fixed_transfers.clone();
        fixed.sort_by_key(|f| f.gameweek);
        fixed
    }

    pub fn fixed_in(&self, gameweek: Gameweek) -> impl Iterator<Item = &FixedTransfer> {
        self.fixed_transfers
            .iter()
            .filter(move |f| f.gameweek == gameweek)
    }

    pub fn has_fixed(&self, gameweek: Gameweek) -> bool {
        self.fixed_in(gameweek).next().is_some()
    }

    /// Whether the search may sell `player` in `gameweek`.
    pub fn can_sell(&self, player: PlayerId, gameweek: Gameweek) -> bool {
        if self.locked.contains(&player) {
            return false;
        }
        !self.fixed_transfers.iter().any(|f| {
            (f.out == player && f.gameweek > gameweek)
                || (f.incoming == player && f.gameweek == gameweek)
        })
    }

    /// Whether the search may buy `player` in `gameweek`.
    pub fn can_buy(&self, player: &Player, gameweek: Gameweek) -> bool {
        if self.avoided.contains(&player.id) || !self.pool_filter.accepts(player) {
            return false;
        }
        !self.fixed_transfers.iter().any(|f| {
            (f.incoming == player.id && f.gameweek > gameweek)
                || (f.out == player.id && f.gameweek == gameweek)
        })
    }

    pub fn chip_permitted(&self, chip: Chip, gameweek: Gameweek) -> bool {
        self.chip_forbid
            .get(&chip)
            .is_none_or(|weeks| !weeks.contains(&gameweek))
    }

    /// Whether automatic chip placement may consider `chip` at all.
    pub fn chip_allowed(&self, chip: Chip) -> bool {
        self.chip_allow.is_none_or(|set| set.contains(chip))
    }

    pub fn within_hits(&self, hits: u32) -> bool {
        self.max_hits.is_none_or(|max| hits <= max)
    }
}
