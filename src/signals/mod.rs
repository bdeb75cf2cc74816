//! Durable gate checkpoints.
//!
//! A signal records the outcome of one gate attempt for one story. Passed
//! signals make gate execution idempotent: a restarted run skips every gate
//! that already has one. Signals are never deleted by the sequencer.

mod store;
mod types;

pub use store::SignalStore;
pub use types::{Outcome, Signal};
