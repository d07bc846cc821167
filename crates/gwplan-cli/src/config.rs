use gwplan_core::economy::{DEFAULT_FREE_TRANSFER_CAP, DEFAULT_HIT_COST, TransferEconomy};
use gwplan_core::objective::ObjectiveMode;
use gwplan_solver::SearchDepth;
use gwplan_solver::solver::{DEFAULT_FT_VALUE, DEFAULT_TOP_PATHS};
use serde::Deserialize;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::Level;

const DEFAULT_SYNTHETIC_SEED: u64 = 2024;
const DEFAULT_HORIZON: usize = 5;
const MAX_HORIZON: usize = 8;
const MAX_FREE_TRANSFER_CAP: u8 = 15;
const MAX_HIT_COST: u32 = 20;
const DEFAULT_TIME_BUDGET_MS: u64 = 4_000;
const RUN_ID_ALLOWED: &str = "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789._-";

/// Root planner configuration loaded from YAML.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct PlannerConfig {
    pub run_id: String,
    #[serde(default)]
    pub data: DataConfig,
    #[serde(default)]
    pub rules: RulesConfig,
    #[serde(default)]
    pub search: SearchConfig,
    pub outputs: OutputsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl PlannerConfig {
    /// Load configuration from a YAML file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let path_buf = path.to_path_buf();
        let file = File::open(path).map_err(|source| ConfigError::Read {
            source,
            path: path_buf.clone(),
        })?;
        let mut cfg: PlannerConfig = serde_yaml::from_reader(BufReader::new(file)).map_err(
            |source| ConfigError::Parse {
                source,
                path: path_buf.clone(),
            },
        )?;
        cfg.validate().map_err(|source| ConfigError::Invalid {
            path: path_buf,
            source,
        })?;
        Ok(cfg)
    }

    /// Validate the configuration without performing I/O.
    pub fn validate(&mut self) -> Result<(), ValidationError> {
        validate_run_id(&self.run_id)?;
        self.data.validate()?;
        self.rules.validate()?;
        self.search.validate()?;
        self.outputs.validate(&self.run_id)?;
        self.logging.normalize();
        Ok(())
    }

    /// Resolve `{run_id}` placeholders into concrete paths.
    pub fn resolved_outputs(&self) -> ResolvedOutputs {
        ResolvedOutputs {
            plan_json: resolve_template(&self.run_id, &self.outputs.plan_json),
            summary_md: resolve_template(&self.run_id, &self.outputs.summary_md),
            snapshot: self
                .data
                .snapshot
                .as_deref()
                .map(|template| resolve_template(&self.run_id, template)),
        }
    }

    pub fn economy(&self) -> TransferEconomy {
        TransferEconomy::new(self.rules.free_transfer_cap, self.rules.hit_cost)
    }
}

/// Where league data comes from.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct DataConfig {
    /// JSON league snapshot; a synthetic league is generated when absent.
    #[serde(default)]
    pub snapshot: Option<String>,
    #[serde(default = "default_synthetic_seed")]
    pub synthetic_seed: u64,
    #[serde(default = "default_horizon")]
    pub horizon: usize,
    /// Manager planned for when the command line names none.
    #[serde(default)]
    pub manager: Option<u64>,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            snapshot: None,
            synthetic_seed: DEFAULT_SYNTHETIC_SEED,
            horizon: DEFAULT_HORIZON,
            manager: None,
        }
    }
}

impl DataConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.snapshot.as_ref().is_some_and(|s| s.trim().is_empty()) {
            return Err(ValidationError::InvalidField {
                field: "data.snapshot".to_string(),
                message: "snapshot path must not be empty".to_string(),
            });
        }
        if self.horizon == 0 || self.horizon > MAX_HORIZON {
            return Err(ValidationError::InvalidField {
                field: "data.horizon".to_string(),
                message: format!("horizon must be between 1 and {MAX_HORIZON}"),
            });
        }
        Ok(())
    }
}

fn default_synthetic_seed() -> u64 {
    DEFAULT_SYNTHETIC_SEED
}

fn default_horizon() -> usize {
    DEFAULT_HORIZON
}

/// Game rules that vary between seasons.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct RulesConfig {
    #[serde(default = "default_free_transfer_cap")]
    pub free_transfer_cap: u8,
    #[serde(default = "default_hit_cost")]
    pub hit_cost: u32,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            free_transfer_cap: DEFAULT_FREE_TRANSFER_CAP,
            hit_cost: DEFAULT_HIT_COST,
        }
    }
}

impl RulesConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.free_transfer_cap == 0 || self.free_transfer_cap > MAX_FREE_TRANSFER_CAP {
            return Err(ValidationError::InvalidField {
                field: "rules.free_transfer_cap".to_string(),
                message: format!("cap must be between 1 and {MAX_FREE_TRANSFER_CAP}"),
            });
        }
        if self.hit_cost > MAX_HIT_COST {
            return Err(ValidationError::InvalidField {
                field: "rules.hit_cost".to_string(),
                message: format!("hit cost must not exceed {MAX_HIT_COST}"),
            });
        }
        Ok(())
    }
}

fn default_free_transfer_cap() -> u8 {
    DEFAULT_FREE_TRANSFER_CAP
}

fn default_hit_cost() -> u32 {
    DEFAULT_HIT_COST
}

/// Search defaults; requests may override most of these.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct SearchConfig {
    #[serde(default)]
    pub depth: SearchDepth,
    #[serde(default)]
    pub objective: ObjectiveMode,
    #[serde(default = "default_time_budget_ms")]
    pub time_budget_ms: u64,
    /// Deterministic cap on generated states; replaces the clock when set.
    #[serde(default)]
    pub step_cap: Option<usize>,
    #[serde(default = "default_top_paths")]
    pub top_paths: usize,
    #[serde(default = "default_ft_value")]
    pub ft_value: f32,
    #[serde(default = "default_parallel")]
    pub parallel: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            depth: SearchDepth::default(),
            objective: ObjectiveMode::default(),
            time_budget_ms: DEFAULT_TIME_BUDGET_MS,
            step_cap: None,
            top_paths: DEFAULT_TOP_PATHS,
            ft_value: DEFAULT_FT_VALUE,
            parallel: true,
        }
    }
}

impl SearchConfig {
    fn validate(&self) -> Result<(), ValidationError> {
        if self.time_budget_ms == 0 {
            return Err(ValidationError::InvalidField {
                field: "search.time_budget_ms".to_string(),
                message: "time budget must be greater than zero".to_string(),
            });
        }
        if self.top_paths == 0 {
            return Err(ValidationError::InvalidField {
                field: "search.top_paths".to_string(),
                message: "at least one path must be returned".to_string(),
            });
        }
        if !self.ft_value.is_finite() || self.ft_value < 0.0 {
            return Err(ValidationError::InvalidField {
                field: "search.ft_value".to_string(),
                message: "ft_value must be a non-negative number".to_string(),
            });
        }
        if self.step_cap == Some(0) {
            return Err(ValidationError::InvalidField {
                field: "search.step_cap".to_string(),
                message: "step cap must be greater than zero".to_string(),
            });
        }
        Ok(())
    }

    pub fn time_budget(&self) -> Duration {
        Duration::from_millis(self.time_budget_ms)
    }
}

fn default_time_budget_ms() -> u64 {
    DEFAULT_TIME_BUDGET_MS
}

fn default_top_paths() -> usize {
    DEFAULT_TOP_PATHS
}

fn default_ft_value() -> f32 {
    DEFAULT_FT_VALUE
}

fn default_parallel() -> bool {
    true
}

/// Output artifact configuration.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct OutputsConfig {
    pub plan_json: String,
    pub summary_md: String,
}

impl OutputsConfig {
    fn validate(&self, run_id: &str) -> Result<(), ValidationError> {
        for (label, value) in [
            ("outputs.plan_json", &self.plan_json),
            ("outputs.summary_md", &self.summary_md),
        ] {
            if value.trim().is_empty() {
                return Err(ValidationError::InvalidField {
                    field: label.to_string(),
                    message: "path must not be empty".to_string(),
                });
            }
            if resolve_template(run_id, value).components().count() == 0 {
                return Err(ValidationError::InvalidField {
                    field: label.to_string(),
                    message: "resolved path is invalid".to_string(),
                });
            }
        }
        Ok(())
    }
}

/// Structured logging is off unless enabled.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct LoggingConfig {
    #[serde(default)]
    pub enable_structured: bool,
    #[serde(default = "default_tracing_level")]
    pub tracing_level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enable_structured: false,
            tracing_level: default_tracing_level(),
        }
    }
}

impl LoggingConfig {
    fn normalize(&mut self) {
        if self.tracing_level.trim().is_empty() {
            self.tracing_level = default_tracing_level();
        }
    }

    pub fn level(&self) -> Option<Level> {
        match self.tracing_level.to_ascii_lowercase().as_str() {
            "trace" => Some(Level::TRACE),
            "debug" => Some(Level::DEBUG),
            "info" => Some(Level::INFO),
            "warn" | "warning" => Some(Level::WARN),
            "error" => Some(Level::ERROR),
            _ => None,
        }
    }
}

fn default_tracing_level() -> String {
    "info".to_string()
}

fn validate_run_id(run_id: &str) -> Result<(), ValidationError> {
    if run_id.trim().is_empty() {
        return Err(ValidationError::InvalidField {
            field: "run_id".to_string(),
            message: "run_id must not be empty".to_string(),
        });
    }
    if !run_id.chars().all(|c| RUN_ID_ALLOWED.contains(c)) {
        return Err(ValidationError::InvalidField {
            field: "run_id".to_string(),
            message: "run_id may only contain alphanumeric characters, '.', '_' or '-'".to_string(),
        });
    }
    Ok(())
}

fn resolve_template(run_id: &str, template: &str) -> PathBuf {
    PathBuf::from(template.replace("{run_id}", run_id))
}

/// Fully resolved file locations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedOutputs {
    pub plan_json: PathBuf,
    pub summary_md: PathBuf,
    pub snapshot: Option<PathBuf>,
}

/// Errors surfaced when loading configuration files.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path:?}: {source}")]
    Read {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },
    #[error("failed to parse config {path:?}: {source}")]
    Parse {
        #[source]
        source: serde_yaml::Error,
        path: PathBuf,
    },
    #[error("invalid configuration in {path:?}: {source}")]
    Invalid {
        path: PathBuf,
        source: ValidationError,
    },
}

impl ConfigError {
    pub fn path(&self) -> &Path {
        match self {
            ConfigError::Read { path, .. }
            | ConfigError::Parse { path, .. }
            | ConfigError::Invalid { path, .. } => path.as_path(),
        }
    }
}

/// Validation failures tagged with the offending field.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("{field}: {message}")]
    InvalidField { field: String, message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASIC_YAML: &str = r#"
run_id: "gw12_plan"
data:
  synthetic_seed: 7
rules:
  free_transfer_cap: 5
search:
  depth: deep
  objective: floor
  time_budget_ms: 2500
outputs:
  plan_json: "out/{run_id}/plan.json"
  summary_md: "out/{run_id}/summary.md"
logging:
  enable_structured: true
  tracing_level: "debug"
"#;

    #[test]
    fn loads_and_validates_basic_config() {
        let mut cfg: PlannerConfig = serde_yaml::from_str(BASIC_YAML).expect("parse yaml");
        cfg.validate().expect("validate");

        assert_eq!(cfg.search.depth, SearchDepth::Deep);
        assert_eq!(cfg.search.objective, ObjectiveMode::Floor);
        assert_eq!(cfg.search.top_paths, DEFAULT_TOP_PATHS);
        assert_eq!(cfg.rules.hit_cost, DEFAULT_HIT_COST);
        assert_eq!(cfg.data.horizon, DEFAULT_HORIZON);
        assert_eq!(cfg.logging.level(), Some(Level::DEBUG));

        let outputs = cfg.resolved_outputs();
        assert_eq!(outputs.plan_json, PathBuf::from("out/gw12_plan/plan.json"));
        assert_eq!(outputs.snapshot, None);
    }

    #[test]
    fn snapshot_path_resolves_run_id() {
        let yaml = BASIC_YAML.replace(
            "  synthetic_seed: 7\n",
            "  snapshot: \"data/{run_id}/league.json\"\n",
        );
        let mut cfg: PlannerConfig = serde_yaml::from_str(&yaml).expect("parse");
        cfg.validate().expect("valid");
        assert_eq!(
            cfg.resolved_outputs().snapshot,
            Some(PathBuf::from("data/gw12_plan/league.json"))
        );
    }

    #[test]
    fn rejects_zero_free_transfer_cap() {
        let yaml = BASIC_YAML.replace("free_transfer_cap: 5", "free_transfer_cap: 0");
        let mut cfg: PlannerConfig = serde_yaml::from_str(&yaml).expect("parse");
        let err = cfg.validate().expect_err("cap of zero");
        assert!(matches!(
            err,
            ValidationError::InvalidField { field, .. } if field == "rules.free_transfer_cap"
        ));
    }

    #[test]
    fn rejects_zero_time_budget() {
        let yaml = BASIC_YAML.replace("time_budget_ms: 2500", "time_budget_ms: 0");
        let mut cfg: PlannerConfig = serde_yaml::from_str(&yaml).expect("parse");
        let err = cfg.validate().expect_err("zero budget");
        assert!(matches!(
            err,
            ValidationError::InvalidField { field, .. } if field == "search.time_budget_ms"
        ));
    }

    #[test]
    fn rejects_invalid_run_id() {
        let yaml = BASIC_YAML.replace("gw12_plan", "gw 12 plan");
        let mut cfg: PlannerConfig = serde_yaml::from_str(&yaml).expect("parse");
        let err = cfg.validate().expect_err("invalid run id");
        assert!(matches!(
            err,
            ValidationError::InvalidField { field, .. } if field == "run_id"
        ));
    }

    #[test]
    fn unknown_depth_fails_to_parse() {
        let yaml = BASIC_YAML.replace("depth: deep", "depth: exhaustive");
        assert!(serde_yaml::from_str::<PlannerConfig>(&yaml).is_err());
    }
}
