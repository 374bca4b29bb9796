#![forbid(unsafe_code)]

//! Simulation harness for `lazyscroll-core`.
//!
//! Plays a host against a deterministic fake dataset: scripted scrolling and
//! key presses, fetches answered after a simulated latency, and a JSONL trace
//! of every step with per-step checksums.

pub mod cli;
pub mod dataset;
pub mod driver;
pub mod trace;

pub use dataset::FakeDataset;
pub use driver::{Action, DriverConfig, DriverStats, PagePlan, ScenarioDriver, StepRecord};
pub use trace::{TraceRecorder, TraceSummary, verify_trace};

/// Scroll down `steps` times, walk the selection, then scroll back up.
#[must_use]
pub fn sweep(steps: usize, stride: f64) -> Vec<Action> {
    let mut actions = Vec::with_capacity(steps * 2 + 8);
    actions.extend(std::iter::repeat_n(Action::ScrollBy(stride), steps));
    actions.extend([Action::KeyDown, Action::KeyDown, Action::KeyDown, Action::Confirm]);
    actions.extend(std::iter::repeat_n(Action::ScrollBy(-stride), steps));
    actions.extend([Action::KeyUp, Action::Idle, Action::Idle, Action::Idle]);
    actions
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sweep_is_symmetric() {
        let actions = sweep(5, 30.0);
        assert_eq!(actions.len(), 18);
        let net: f64 = actions
            .iter()
            .map(|action| match action {
                Action::ScrollBy(px) => *px,
                _ => 0.0,
            })
            .sum();
        assert_eq!(net, 0.0);
    }
}
