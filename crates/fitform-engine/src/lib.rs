//! fitform-engine: Headless controller for multi-step form progress
//!
//! This crate provides the state machine behind a multi-step form that ends
//! in a single generation request, including:
//! - Step sequencing and completion percentages
//! - The single-request lifecycle (start, complete, cancel, reset)
//! - Timer-driven simulated request progress
//! - A blended overall progress figure for one progress bar
//! - Tokio glue for driving the controller against wall-clock time

pub mod completion;
pub mod config;
pub mod controller;
pub mod driver;
pub mod simulator;
pub mod state;
pub mod steps;
pub mod timer;

// Re-export commonly used types
pub use completion::{form_completion_percentage, overall_progress};
pub use config::{ConfigError, FormConfig, SimulatedProgressConfig};
pub use controller::{FormEvent, FormProgressController, RequestSettlement};
pub use driver::{ClockHandle, SharedController};
pub use simulator::ProgressSimulator;
pub use state::{FormProgressSnapshot, RequestOutcome, RequestStatus};
pub use steps::{FormError, Position, StepId, StepSequence};
pub use timer::{TimerHandle, TimerQueue};

/// Returns the engine version.
pub fn engine_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_version() {
        let version = engine_version();
        assert!(!version.is_empty());
        assert!(version.starts_with("0."));
    }
}
