//! Simulated agent latency.
//!
//! The [`Pacer`] trait decouples the refinement loop from wall-clock sleeps.
//! The CLI uses [`ThreadPacer`]; tests use [`InstantPacer`] or a recording
//! pacer so the loop runs without delay.

use std::thread;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::trace;

/// Point in a cycle where the loop yields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Drafting,
    Scanning,
    Critiquing,
    Deciding,
    /// Pause before the next cycle starts.
    CycleGap,
}

/// Abstraction over the delay between loop steps.
///
/// A pause carries no meaning beyond ordering: the step before it has
/// completed when `pause` is called.
pub trait Pacer {
    fn pause(&self, stage: Stage, duration: Duration);
}

/// Pacer that blocks the current thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadPacer;

impl Pacer for ThreadPacer {
    fn pause(&self, stage: Stage, duration: Duration) {
        if duration.is_zero() {
            return;
        }
        trace!(?stage, ?duration, "pausing");
        thread::sleep(duration);
    }
}

/// Pacer that never waits.
#[derive(Debug, Clone, Copy, Default)]
pub struct InstantPacer;

impl Pacer for InstantPacer {
    fn pause(&self, _stage: Stage, _duration: Duration) {}
}

/// Per-stage delays in milliseconds (TOML section `[pacing]`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PacingConfig {
    pub draft_ms: u64,
    pub safety_ms: u64,
    pub critic_ms: u64,
    pub decision_ms: u64,
    pub cycle_gap_ms: u64,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            draft_ms: 1500,
            safety_ms: 800,
            critic_ms: 1000,
            decision_ms: 500,
            cycle_gap_ms: 1000,
        }
    }
}

impl PacingConfig {
    /// All delays zero.
    pub fn none() -> Self {
        Self {
            draft_ms: 0,
            safety_ms: 0,
            critic_ms: 0,
            decision_ms: 0,
            cycle_gap_ms: 0,
        }
    }

    pub fn delay(&self, stage: Stage) -> Duration {
        let millis = match stage {
            Stage::Drafting => self.draft_ms,
            Stage::Scanning => self.safety_ms,
            Stage::Critiquing => self.critic_ms,
            Stage::Deciding => self.decision_ms,
            Stage::CycleGap => self.cycle_gap_ms,
        };
        Duration::from_millis(millis)
    }
}
