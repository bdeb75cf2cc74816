pub mod executor;
pub mod sequencer;

#[cfg(test)]
pub(crate) mod testing;

pub use executor::{ALREADY_PASSED, GateExecutor, GateOutcome};
pub use sequencer::{ExecutionResult, GatePlan, RunOptions, Sequencer};
