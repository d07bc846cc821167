use gwplan_core::economy::TransferEconomy;
use gwplan_core::lineup::{Lineup, LineupEntry, LineupScoring, select_lineup};
use gwplan_core::model::{ChipSet, FixtureCalendar, Gameweek, Horizon, Price, Squad};
use gwplan_core::objective::ObjectiveMode;
use gwplan_core::pool::PlayerPool;
use gwplan_core::projection::ProjectionTable;

use crate::constraints::PlanConstraints;
use crate::error::SolveError;
use crate::scores::ScoreBook;

/// Manager state and league data the search starts from.
#[derive(Debug, Clone)]
pub struct PlanningInput<'a> {
    pub squad: Squad,
    pub bank: Price,
    pub free_transfers: u8,
    pub chips_available: ChipSet,
    pub horizon: &'a Horizon,
    pub pool: &'a PlayerPool,
    pub projections: &'a ProjectionTable,
    pub calendar: &'a FixtureCalendar,
}

/// Validated inputs plus precomputed objective scores, shared read-only by
/// every search branch.
#[derive(Debug, Clone)]
pub struct PlanningContext<'a> {
    pub input: PlanningInput<'a>,
    pub constraints: PlanConstraints,
    pub objective: ObjectiveMode,
    pub economy: TransferEconomy,
    pub book: ScoreBook,
}

impl<'a> PlanningContext<'a> {
    pub fn prepare(
        mut input: PlanningInput<'a>,
        constraints: PlanConstraints,
        objective: ObjectiveMode,
        economy: TransferEconomy,
    ) -> Result<Self, SolveError> {
        if !input.horizon.is_valid() {
            return Err(SolveError::InvalidHorizon);
        }
        for slot in input.squad.iter() {
            if !input.pool.contains(slot.player) {
                return Err(SolveError::UnknownSquadPlayer(slot.player));
            }
        }
        constraints.validate(&input.squad, input.bank, input.pool, input.horizon)?;

        let gameweeks = input.horizon.upcoming.as_slice();
        for slot in input.squad.iter() {
            if let Some(gameweek) = input.projections.first_gap(slot.player, gameweeks) {
                return Err(SolveError::MissingProjection {
                    player: slot.player,
                    gameweek,
                });
            }
        }

        input.free_transfers = economy.clamp(input.free_transfers);
        let book = ScoreBook::build(
            input.pool,
            input.projections,
            input.calendar,
            gameweeks,
            objective,
        );
        Ok(Self {
            input,
            constraints,
            objective,
            economy,
            book,
        })
    }

    pub fn gameweeks(&self) -> &[Gameweek] {
        self.book.gameweeks()
    }

    pub fn horizon_len(&self) -> usize {
        self.book.len()
    }

    pub fn entries(&self, idx: usize, squad: &Squad) -> Result<Vec<LineupEntry>, SolveError> {
        squad
            .iter()
            .map(|slot| {
                let score =
                    self.book
                        .score(idx, slot.player)
                        .ok_or(SolveError::MissingProjection {
                            player: slot.player,
                            gameweek: self.gameweeks()[idx],
                        })?;
                Ok(LineupEntry {
                    player: slot.player,
                    position: slot.position,
                    score,
                })
            })
            .collect()
    }

    /// Best lineup for `squad` in gameweek `idx` under normal scoring.
    pub fn lineup(&self, idx: usize, squad: &Squad) -> Result<Lineup, SolveError> {
        self.lineup_with(idx, squad, LineupScoring::default())
    }

    pub fn lineup_with(
        &self,
        idx: usize,
        squad: &Squad,
        scoring: LineupScoring,
    ) -> Result<Lineup, SolveError> {
        let entries = self.entries(idx, squad)?;
        Ok(select_lineup(&entries, scoring)?)
    }
}
