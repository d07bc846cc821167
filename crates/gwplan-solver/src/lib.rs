pub mod budget;
pub mod candidates;
pub mod chips;
pub mod constraints;
pub mod context;
pub mod depth;
pub mod error;
pub mod memo;
pub mod plan;
pub mod rebuild;
pub mod recommend;
pub mod scores;
pub mod solver;
pub mod suggest;

pub use chips::{ChipError, ChipMode, ChipPlan, ChipSchedule};
pub use constraints::{ConstraintError, FixedTransfer, PlanConstraints};
pub use context::{PlanningContext, PlanningInput};
pub use depth::{SearchDepth, SearchLimits};
pub use error::SolveError;
pub use plan::{GameweekAction, GameweekPlan, SquadCarry, Transfer, TransferPath};
pub use recommend::{Recommendation, recommend_transfers};
pub use solver::{PathSolver, SearchStats, SolveOptions, SolveOutcome};
pub use suggest::{ChipSuggestion, suggest_chips};
