pub mod agent;
pub mod config;
pub mod errors;
pub mod gate_config;
pub mod gates;
pub mod orchestrator;
pub mod prompt;
pub mod signals;
pub mod story;
pub mod stream;
pub mod telemetry;
