use gwplan_core::model::{Chip, ChipSet, Gameweek, PlayerId};
use gwplan_core::objective::ObjectiveMode;
use gwplan_core::pool::PoolFilter;
use gwplan_solver::{ChipMode, ChipPlan, FixedTransfer, PlanConstraints, SearchDepth};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::sources::ManagerId;

/// Player and hit restrictions supplied with a plan request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RequestConstraints {
    pub locked: Vec<PlayerId>,
    pub avoid: Vec<PlayerId>,
    pub max_hits: Option<u32>,
    /// Restricts the incoming player pool.
    pub pool: PoolFilter,
}

/// Everything a caller may ask of the planner. Unset options fall back to the
/// configured search defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PlanRequest {
    pub manager: Option<ManagerId>,
    /// Overrides the manager's free transfer count.
    pub ft: Option<u8>,
    pub chip_mode: ChipMode,
    pub chip_plan: ChipPlan,
    pub chip_allow: Option<ChipSet>,
    pub chip_forbid: BTreeMap<Chip, BTreeSet<Gameweek>>,
    pub chip_compare: bool,
    pub fixed_transfers: Vec<FixedTransfer>,
    pub ft_value: Option<f32>,
    pub depth: Option<SearchDepth>,
    pub skip_solve: bool,
    pub objective_mode: Option<ObjectiveMode>,
    pub constraints: RequestConstraints,
    pub time_budget_ms: Option<u64>,
    pub top_paths: Option<usize>,
}

#[derive(Debug, Error)]
pub enum RequestError {
    #[error("failed to read request {path:?}: {source}")]
    Read {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },
    #[error("malformed request: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("a manager id is required")]
    MissingManager,
    #[error("{field}: {message}")]
    InvalidField { field: &'static str, message: String },
}

impl PlanRequest {
    pub fn for_manager(manager: ManagerId) -> Self {
        Self {
            manager: Some(manager),
            ..Self::default()
        }
    }

    pub fn from_json(json: &str) -> Result<Self, RequestError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, RequestError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|source| RequestError::Read {
            source,
            path: path.to_path_buf(),
        })?;
        Self::from_json(&json)
    }

    /// Reject requests that cannot be planned regardless of league data.
    pub fn validate(&self, free_transfer_cap: u8) -> Result<ManagerId, RequestError> {
        let manager = self.manager.ok_or(RequestError::MissingManager)?;
        if manager.0 == 0 {
            return Err(RequestError::InvalidField {
                field: "manager",
                message: "manager id must be positive".to_string(),
            });
        }
        if self.ft.is_some_and(|ft| ft > free_transfer_cap) {
            return Err(RequestError::InvalidField {
                field: "ft",
                message: format!("free transfers cannot exceed the cap of {free_transfer_cap}"),
            });
        }
        if self
            .ft_value
            .is_some_and(|value| !value.is_finite() || value < 0.0)
        {
            return Err(RequestError::InvalidField {
                field: "ft_value",
                message: "ft_value must be a non-negative number".to_string(),
            });
        }
        if self.top_paths == Some(0) {
            return Err(RequestError::InvalidField {
                field: "top_paths",
                message: "at least one path must be requested".to_string(),
            });
        }
        if self.time_budget_ms == Some(0) {
            return Err(RequestError::InvalidField {
                field: "time_budget_ms",
                message: "time budget must be greater than zero".to_string(),
            });
        }
        if self.chip_mode == ChipMode::Locked && self.chip_plan.is_empty() {
            return Err(RequestError::InvalidField {
                field: "chip_plan",
                message: "locked chip mode needs at least one planned chip".to_string(),
            });
        }
        for fixed in &self.fixed_transfers {
            if fixed.out == fixed.incoming {
                return Err(RequestError::InvalidField {
                    field: "fixed_transfers",
                    message: format!("{} cannot replace itself in {}", fixed.out, fixed.gameweek),
                });
            }
        }
        Ok(manager)
    }

    pub fn plan_constraints(&self) -> PlanConstraints {
        PlanConstraints {
            locked: self.constraints.locked.iter().copied().collect(),
            avoided: self.constraints.avoid.iter().copied().collect(),
            max_hits: self.constraints.max_hits,
            chip_forbid: self.chip_forbid.clone(),
            chip_allow: self.chip_allow,
            fixed_transfers: self.fixed_transfers.clone(),
            pool_filter: self.constraints.pool.clone(),
        }
    }
}
