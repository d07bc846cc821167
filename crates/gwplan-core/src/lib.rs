#![deny(warnings)]
pub mod economy;
pub mod lineup;
pub mod model;
pub mod objective;
pub mod pool;
pub mod projection;
pub mod synthetic;

pub struct PlannerInfo;

impl PlannerInfo {
    pub const fn name() -> &'static str {
        "gwplan"
    }

    pub const fn codename() -> &'static str {
        "Transfer Path Planner"
    }

    pub const fn version() -> &'static str {
        env!("CARGO_PKG_VERSION")
    }
}
