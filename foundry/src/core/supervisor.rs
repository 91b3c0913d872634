//! Continue-or-halt policy for the refinement loop.

use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};

use crate::core::types::{CriticNote, HaltRule, Priority, SafetyFlag, Severity, Verdict};

const MAX_ITERATIONS_REASON: &str = "Maximum iterations reached. Pausing for human review.";
const QUALITY_THRESHOLD_REASON: &str = "Quality threshold met. Draft ready for human review.";
const ACCEPTABLE_QUALITY_REASON: &str = "Acceptable quality reached. Pausing for human approval.";
const CONTINUE_REASON: &str = "Issues detected. Continuing refinement loop.";

/// Supervisor limits (TOML section `[supervisor]`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SupervisorPolicy {
    /// Hard cap on iterations; reaching it always halts.
    pub max_iterations: u32,
    /// Max combined flags+notes for a clean halt with no high-severity items.
    pub quality_threshold: usize,
    /// Max combined flags+notes for a halt once a prior iteration has run.
    pub acceptable_threshold: usize,
}

impl Default for SupervisorPolicy {
    fn default() -> Self {
        Self {
            max_iterations: 5,
            quality_threshold: 2,
            acceptable_threshold: 3,
        }
    }
}

impl SupervisorPolicy {
    pub fn validate(&self) -> Result<()> {
        if self.max_iterations == 0 {
            return Err(anyhow!("supervisor.max_iterations must be > 0"));
        }
        Ok(())
    }

    /// Decide whether the loop continues after `iteration` (1-based) completed.
    ///
    /// Rules apply in order: iteration cap, clean quality threshold, then the
    /// relaxed threshold which only applies after the first iteration.
    pub fn decide(&self, iteration: u32, flags: &[SafetyFlag], notes: &[CriticNote]) -> Verdict {
        if iteration >= self.max_iterations {
            return halt(HaltRule::MaxIterations, MAX_ITERATIONS_REASON);
        }

        let high_flags = flags.iter().filter(|f| f.severity == Severity::High).count();
        let high_notes = notes.iter().filter(|n| n.priority == Priority::High).count();
        let total = flags.len() + notes.len();

        if high_flags + high_notes == 0 && total <= self.quality_threshold {
            return halt(HaltRule::QualityThreshold, QUALITY_THRESHOLD_REASON);
        }

        if iteration > 1 && total <= self.acceptable_threshold {
            return halt(HaltRule::AcceptableQuality, ACCEPTABLE_QUALITY_REASON);
        }

        Verdict {
            should_continue: true,
            reason: CONTINUE_REASON.to_string(),
            halt: None,
        }
    }
}

fn halt(rule: HaltRule, reason: &str) -> Verdict {
    Verdict {
        should_continue: false,
        reason: reason.to_string(),
        halt: Some(rule),
    }
}
