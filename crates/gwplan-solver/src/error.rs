use gwplan_core::lineup::LineupError;
use gwplan_core::model::{Gameweek, PlayerId, SquadError};
use thiserror::Error;

use crate::chips::ChipError;
use crate::constraints::ConstraintError;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SolveError {
    #[error("planning horizon is empty or out of order")]
    InvalidHorizon,
    #[error("constraints cannot be satisfied: {0}")]
    Constraint(#[from] ConstraintError),
    #[error("chip plan rejected: {0}")]
    Chip(#[from] ChipError),
    #[error("no projection for squad player {player} in {gameweek}")]
    MissingProjection { player: PlayerId, gameweek: Gameweek },
    #[error("squad player {0} is missing from the player pool")]
    UnknownSquadPlayer(PlayerId),
    #[error("no path can honour the fixed transfers in {0}")]
    NoFeasiblePath(Gameweek),
    #[error("lineup selection failed: {0}")]
    Lineup(#[from] LineupError),
    #[error("squad became illegal: {0}")]
    Squad(#[from] SquadError),
}

impl SolveError {
    /// Broken internal invariant rather than bad input or missing data.
    pub fn is_internal(&self) -> bool {
        matches!(self, SolveError::Lineup(_) | SolveError::Squad(_))
    }

    /// Inputs that conflict with each other.
    pub fn is_infeasible(&self) -> bool {
        match self {
            SolveError::Constraint(_) | SolveError::NoFeasiblePath(_) => true,
            SolveError::Chip(err) => err.is_constraint_conflict(),
            _ => false,
        }
    }

    pub fn is_missing_data(&self) -> bool {
        matches!(
            self,
            SolveError::MissingProjection { .. } | SolveError::UnknownSquadPlayer(_)
        )
    }
}
