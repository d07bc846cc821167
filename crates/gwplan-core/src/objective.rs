use core::fmt;
use core::str::FromStr;
use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, Normal};
use std::sync::OnceLock;

use crate::model::gameweek::FixtureOutlook;
use crate::projection::Projection;

/// Share of the mean treated as one standard deviation for a fully unreliable player.
const SPREAD: f32 = 0.6;
const FLOOR_QUANTILE: f64 = 0.2;
const CEILING_QUANTILE: f64 = 0.8;
/// Portion of the gap to the "if fit" projection credited as upside.
const IF_FIT_UPSIDE: f32 = 0.5;
const DOUBLE_UPSIDE: f32 = 0.15;

/// How player projections are turned into the scores the planner maximizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectiveMode {
    #[default]
    Expected,
    Floor,
    Ceiling,
}

impl ObjectiveMode {
    pub const fn label(self) -> &'static str {
        match self {
            ObjectiveMode::Expected => "expected",
            ObjectiveMode::Floor => "floor",
            ObjectiveMode::Ceiling => "ceiling",
        }
    }

    pub fn score(self, projection: &Projection, outlook: FixtureOutlook) -> f32 {
        match self {
            ObjectiveMode::Expected => projection.mean_points,
            ObjectiveMode::Floor => floor_score(projection),
            ObjectiveMode::Ceiling => ceiling_score(projection, outlook),
        }
    }
}

impl fmt::Display for ObjectiveMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ObjectiveMode {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "expected" | "mean" => Ok(ObjectiveMode::Expected),
            "floor" | "safe" => Ok(ObjectiveMode::Floor),
            "ceiling" | "upside" => Ok(ObjectiveMode::Ceiling),
            other => Err(format!("unknown objective mode '{other}'")),
        }
    }
}

/// Standard normal quantiles for the floor and ceiling percentiles.
fn quantiles() -> (f32, f32) {
    static CACHED: OnceLock<(f32, f32)> = OnceLock::new();
    *CACHED.get_or_init(|| match Normal::new(0.0, 1.0) {
        Ok(standard) => (
            standard.inverse_cdf(FLOOR_QUANTILE) as f32,
            standard.inverse_cdf(CEILING_QUANTILE) as f32,
        ),
        Err(_) => (-0.84, 0.84),
    })
}

fn deviation(projection: &Projection) -> f32 {
    let mean = projection.mean_points;
    if !mean.is_finite() {
        return 0.0;
    }
    mean.abs() * SPREAD * (1.0 - projection.reliability())
}

/// Low percentile of Normal(mean, sd); never above the mean.
fn floor_score(projection: &Projection) -> f32 {
    let (low, _) = quantiles();
    projection.mean_points + low.min(0.0) * deviation(projection)
}

/// Mean plus the high-percentile spread, unrealized "if fit" upside and a
/// double-gameweek bonus; never below the mean.
fn ceiling_score(projection: &Projection, outlook: FixtureOutlook) -> f32 {
    let (_, high) = quantiles();
    let mean = projection.mean_points;
    let spread = high.max(0.0) * deviation(projection);
    let fit_gap = (projection.if_fit_points - mean).max(0.0);
    let double = match outlook {
        FixtureOutlook::Double => DOUBLE_UPSIDE * mean.max(0.0),
        FixtureOutlook::Single | FixtureOutlook::Blank => 0.0,
    };
    mean + spread + IF_FIT_UPSIDE * fit_gap + double
}
