use std::path::PathBuf;

use gwplan_core::model::{Gameweek, SquadError};
use gwplan_core::synthetic::{SyntheticConfig, SyntheticLeague};
use thiserror::Error;
use tracing::{Level, event};

use crate::config::{PlannerConfig, ResolvedOutputs};
use crate::orchestrator::{PlanError, PlanOrchestrator, PlanResponse, PlannerSettings};
use crate::report::{self, ReportError};
use crate::request::PlanRequest;
use crate::sources::{ManagerId, SnapshotStore, SourceError};

const SYNTHETIC_FIRST_GAMEWEEK: Gameweek = Gameweek(10);
const DEFAULT_MANAGER: ManagerId = ManagerId(1);

/// Loads league data once and answers plan requests against it.
pub struct PlanRunner {
    config: PlannerConfig,
    outputs: ResolvedOutputs,
    store: SnapshotStore,
}

/// Summary details returned after a run.
pub struct RunSummary {
    pub response: PlanResponse,
    pub plan_path: PathBuf,
    pub summary_path: PathBuf,
}

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("league data: {0}")]
    Source(#[from] SourceError),
    #[error("synthetic league could not build a squad: {0}")]
    Synthetic(#[from] SquadError),
    #[error("planning failed ({}): {0}", .0.status_code())]
    Plan(#[from] PlanError),
    #[error("report error: {0}")]
    Report(#[from] ReportError),
}

impl PlanRunner {
    /// Build a runner from a validated configuration.
    pub fn new(config: PlannerConfig, outputs: ResolvedOutputs) -> Result<Self, RunnerError> {
        let store = match outputs.snapshot.as_ref() {
            Some(path) => SnapshotStore::from_path(path)?,
            None => {
                let league = SyntheticLeague::generate(&SyntheticConfig {
                    seed: config.data.synthetic_seed,
                    first_gameweek: SYNTHETIC_FIRST_GAMEWEEK,
                    horizon: config.data.horizon,
                    ..SyntheticConfig::default()
                })?;
                event!(
                    target: "gwplan_cli::plan",
                    Level::INFO,
                    seed = config.data.synthetic_seed,
                    players = league.players.len(),
                    horizon = league.horizon.len(),
                    "generated synthetic league"
                );
                SnapshotStore::from_synthetic(&league, default_manager(&config))
            }
        };
        Ok(Self {
            config,
            outputs,
            store,
        })
    }

    /// Request for the configured manager with every option left to the config.
    pub fn default_request(&self) -> PlanRequest {
        PlanRequest::for_manager(default_manager(&self.config))
    }

    pub fn run(&self, request: &PlanRequest) -> Result<RunSummary, RunnerError> {
        let orchestrator = PlanOrchestrator::new(
            &self.store,
            &self.store,
            &self.store,
            PlannerSettings::from_config(&self.config),
        );
        let response = orchestrator.get_optimal_plan(request)?;

        report::write_json(&response, &self.outputs.plan_json)?;
        report::write_summary(&response, &self.outputs.summary_md)?;
        event!(
            target: "gwplan_cli::plan",
            Level::INFO,
            run_id = %self.config.run_id,
            plan = %self.outputs.plan_json.display(),
            "reports written"
        );

        Ok(RunSummary {
            response,
            plan_path: self.outputs.plan_json.clone(),
            summary_path: self.outputs.summary_md.clone(),
        })
    }
}

fn default_manager(config: &PlannerConfig) -> ManagerId {
    config.data.manager.map(ManagerId).unwrap_or(DEFAULT_MANAGER)
}
