//! The four simulated agents, wired from configuration.
//!
//! [`Agents`] owns the compiled rules for the drafter, safety scanner, critic
//! and supervisor. Each method delegates to a pure function in [`crate::core`]
//! and adds tracing; none of them touch session state.

use anyhow::Result;
use tracing::{debug, instrument};

use crate::core::critic::{CriticRules, critique};
use crate::core::drafter::{DraftRequest, Drafter};
use crate::core::safety::SafetyScanner;
use crate::core::supervisor::SupervisorPolicy;
use crate::core::types::{CriticNote, Draft, SafetyFlag, Verdict};
use crate::io::config::FoundryConfig;
use crate::io::pacer::PacingConfig;

pub struct Agents {
    drafter: Drafter,
    scanner: SafetyScanner,
    critic: CriticRules,
    supervisor: SupervisorPolicy,
    pacing: PacingConfig,
}

impl Agents {
    pub fn from_config(cfg: &FoundryConfig) -> Result<Self> {
        cfg.validate()?;
        Ok(Self {
            drafter: Drafter::new(cfg.drafter.clone())?,
            scanner: SafetyScanner::new(&cfg.safety)?,
            critic: cfg.critic.clone(),
            supervisor: cfg.supervisor.clone(),
            pacing: cfg.pacing.clone(),
        })
    }

    /// Swap in a different drafter, keeping every other agent.
    #[cfg(test)]
    pub(crate) fn with_drafter(mut self, drafter: Drafter) -> Self {
        self.drafter = drafter;
        self
    }

    pub fn pacing(&self) -> &PacingConfig {
        &self.pacing
    }

    #[instrument(skip_all, fields(revised = request.feedback.is_some()))]
    pub fn draft(&self, request: &DraftRequest<'_>) -> Result<Draft> {
        let draft = self.drafter.draft(request)?;
        debug!(title = %draft.title, "draft generated");
        Ok(draft)
    }

    #[instrument(skip_all)]
    pub fn scan(&self, draft: &Draft) -> Vec<SafetyFlag> {
        let flags = self.scanner.scan(draft);
        debug!(flags = flags.len(), "safety scan complete");
        flags
    }

    #[instrument(skip_all)]
    pub fn critique(&self, draft: &Draft, flags: &[SafetyFlag]) -> Vec<CriticNote> {
        let notes = critique(&self.critic, draft, flags);
        debug!(notes = notes.len(), "critique complete");
        notes
    }

    #[instrument(skip(self, flags, notes))]
    pub fn decide(&self, iteration: u32, flags: &[SafetyFlag], notes: &[CriticNote]) -> Verdict {
        let verdict = self.supervisor.decide(iteration, flags, notes);
        debug!(should_continue = verdict.should_continue, halt = ?verdict.halt, "supervisor verdict");
        verdict
    }
}
