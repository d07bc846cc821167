pub mod config;
pub mod logging;
pub mod orchestrator;
pub mod report;
pub mod request;
pub mod runner;
pub mod sources;
