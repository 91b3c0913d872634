//! In-process command interface for a presentation layer.
//!
//! [`Foundry`] owns the one mutable [`Session`] and exposes the commands a UI
//! (or the CLI) issues. Validation happens here, before any state changes:
//! a rejected command returns [`CommandError`] and leaves the session as it
//! was.

use anyhow::Result;
use tracing::{info, warn};

use crate::agents::Agents;
use crate::core::types::{Agent, Draft, LogKind, Status};
use crate::error::CommandError;
use crate::io::config::FoundryConfig;
use crate::io::pacer::Pacer;
use crate::looping::{CycleOutcome, LoopOutcome, run_loop};
use crate::session::Session;

pub struct Foundry<P: Pacer> {
    session: Session,
    agents: Agents,
    pacer: P,
}

impl<P: Pacer> Foundry<P> {
    pub fn new(cfg: &FoundryConfig, pacer: P) -> Result<Self> {
        Ok(Self {
            session: Session::new(),
            agents: Agents::from_config(cfg)?,
            pacer,
        })
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Store the intent for a new session.
    pub fn submit_intent(&mut self, text: &str) -> Result<(), CommandError> {
        let intent = text.trim();
        if intent.is_empty() {
            return Err(reject(CommandError::EmptyIntent));
        }
        self.require_status("submit_intent", Status::Idle)?;
        self.session.set_intent(intent.to_string());
        info!(intent, "intent submitted");
        Ok(())
    }

    /// Start automatic refinement and run it until the supervisor halts.
    pub fn begin_processing(&mut self) -> Result<LoopOutcome> {
        self.begin_processing_with(|_| {})
    }

    /// Like [`Foundry::begin_processing`], reporting each cycle to `on_cycle`.
    pub fn begin_processing_with<F: FnMut(&CycleOutcome)>(
        &mut self,
        on_cycle: F,
    ) -> Result<LoopOutcome> {
        self.require_status("begin_processing", Status::Idle)?;
        if self.session.intent().is_empty() {
            return Err(reject(CommandError::MissingIntent).into());
        }
        self.session.set_status(Status::Drafting);
        run_loop(&mut self.session, &self.agents, &self.pacer, on_cycle)
    }

    /// Accept the current draft. `final` is terminal.
    pub fn approve_draft(&mut self) -> Result<(), CommandError> {
        self.require_status("approve_draft", Status::Paused)?;
        self.session.log(
            Agent::System,
            LogKind::Success,
            "Human approved the protocol. Finalizing...",
        );
        self.session.set_status(Status::Final);
        info!(iteration = self.session.iteration(), "protocol approved");
        Ok(())
    }

    /// Send the draft back for another round of refinement.
    ///
    /// The feedback is logged and handed to the drafter; the iteration counter
    /// keeps counting from where it stopped.
    pub fn request_revision(&mut self, feedback: &str) -> Result<LoopOutcome> {
        self.request_revision_with(feedback, |_| {})
    }

    pub fn request_revision_with<F: FnMut(&CycleOutcome)>(
        &mut self,
        feedback: &str,
        on_cycle: F,
    ) -> Result<LoopOutcome> {
        let feedback = feedback.trim();
        if feedback.is_empty() {
            return Err(reject(CommandError::EmptyFeedback).into());
        }
        self.require_status("request_revision", Status::Paused)?;

        self.session.push_feedback(feedback.to_string());
        self.session.log(
            Agent::System,
            LogKind::Info,
            format!("Human requested revision: {feedback}"),
        );
        self.session.log(
            Agent::System,
            LogKind::Info,
            "Restarting agent refinement cycle...",
        );
        self.session.set_status(Status::Drafting);
        run_loop(&mut self.session, &self.agents, &self.pacer, on_cycle)
    }

    /// Replace the current draft with a human edit made during review.
    ///
    /// The edit is not archived and does not re-run the analysis.
    pub fn edit_draft(&mut self, draft: Draft) -> Result<(), CommandError> {
        let fields = draft.blank_fields();
        if !fields.is_empty() {
            return Err(reject(CommandError::BlankDraft { fields }));
        }
        self.require_status("edit_draft", Status::Paused)?;
        self.session.replace_draft(draft);
        self.session
            .log(Agent::System, LogKind::Info, "Human edited the draft");
        Ok(())
    }

    /// Discard the session and return to the initial defaults.
    pub fn restart_session(&mut self) {
        info!(
            iteration = self.session.iteration(),
            status = self.session.status().as_str(),
            "session restarted"
        );
        self.session.reset();
    }

    fn require_status(&self, command: &'static str, expected: Status) -> Result<(), CommandError> {
        let status = self.session.status();
        if status != expected {
            return Err(reject(CommandError::InvalidStatus { command, status }));
        }
        Ok(())
    }
}

fn reject(err: CommandError) -> CommandError {
    warn!(%err, "command rejected");
    err
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{HaltRule, Page};
    use crate::test_support::{draft_with, instant_foundry};

    fn rejection(err: &anyhow::Error) -> Option<&CommandError> {
        err.downcast_ref::<CommandError>()
    }

    #[test]
    fn empty_intent_is_rejected() {
        let mut foundry = instant_foundry();
        assert_eq!(foundry.submit_intent("   "), Err(CommandError::EmptyIntent));
        assert_eq!(foundry.session(), &Session::new());
    }

    #[test]
    fn submit_trims_intent() {
        let mut foundry = instant_foundry();
        foundry.submit_intent("  stress at work \n").expect("submit");
        assert_eq!(foundry.session().intent(), "stress at work");
    }

    #[test]
    fn processing_requires_an_intent() {
        let mut foundry = instant_foundry();
        let err = foundry.begin_processing().unwrap_err();
        assert_eq!(rejection(&err), Some(&CommandError::MissingIntent));
        assert_eq!(foundry.session().status(), Status::Idle);
    }

    #[test]
    fn processing_pauses_for_review() {
        let mut foundry = instant_foundry();
        foundry.submit_intent("test").expect("submit");
        let outcome = foundry.begin_processing().expect("process");

        assert_eq!(outcome.halt, HaltRule::QualityThreshold);
        assert_eq!(foundry.session().status(), Status::Paused);
        assert_eq!(foundry.session().current_page(), Page::Review);
    }

    #[test]
    fn approval_is_terminal() {
        let mut foundry = instant_foundry();
        foundry.submit_intent("test").expect("submit");
        foundry.begin_processing().expect("process");
        foundry.approve_draft().expect("approve");
        let finished = foundry.session().clone();

        assert_eq!(
            foundry.approve_draft(),
            Err(CommandError::InvalidStatus {
                command: "approve_draft",
                status: Status::Final,
            })
        );
        let err = foundry.request_revision("again").unwrap_err();
        assert!(rejection(&err).is_some());
        assert!(foundry.edit_draft(finished.draft().expect("draft").clone()).is_err());
        assert_eq!(foundry.session(), &finished);
    }

    #[test]
    fn empty_feedback_leaves_session_unchanged() {
        let mut foundry = instant_foundry();
        foundry.submit_intent("test").expect("submit");
        foundry.begin_processing().expect("process");
        let before = foundry.session().clone();

        let err = foundry.request_revision(" \t").unwrap_err();
        assert_eq!(rejection(&err), Some(&CommandError::EmptyFeedback));
        assert_eq!(foundry.session(), &before);
    }

    #[test]
    fn revision_continues_iteration_count_and_threads_feedback() {
        let mut foundry = instant_foundry();
        foundry.submit_intent("test").expect("submit");
        foundry.begin_processing().expect("process");

        let outcome = foundry
            .request_revision("include a grounding exercise")
            .expect("revise");
        let session = foundry.session();

        assert_eq!(outcome.started_at_iteration, 2);
        assert_eq!(session.iteration(), 2);
        assert_eq!(session.previous_drafts().len(), 2);
        assert_eq!(session.status(), Status::Paused);
        assert_eq!(session.revision_feedback(), &["include a grounding exercise"]);
        assert!(
            session
                .draft()
                .expect("draft")
                .sections
                .introduction
                .contains("include a grounding exercise")
        );
        assert!(
            session
                .logs()
                .iter()
                .any(|l| l.message == "Human requested revision: include a grounding exercise")
        );
    }

    #[test]
    fn approval_requires_review() {
        let mut foundry = instant_foundry();
        assert_eq!(
            foundry.approve_draft(),
            Err(CommandError::InvalidStatus {
                command: "approve_draft",
                status: Status::Idle,
            })
        );
    }

    #[test]
    fn edit_replaces_current_draft_only() {
        let mut foundry = instant_foundry();
        foundry.submit_intent("test").expect("submit");
        foundry.begin_processing().expect("process");

        let edited = draft_with("intro", "cr", "ba", "exp", "refl?");
        foundry.edit_draft(edited.clone()).expect("edit");
        assert_eq!(foundry.session().draft(), Some(&edited));
        assert_eq!(foundry.session().previous_drafts().len(), 1);
        assert_eq!(foundry.session().status(), Status::Paused);
    }

    #[test]
    fn blank_edit_is_rejected() {
        let mut foundry = instant_foundry();
        foundry.submit_intent("test").expect("submit");
        foundry.begin_processing().expect("process");
        let before = foundry.session().clone();

        let edited = draft_with("intro", "", "ba", "exp", "refl");
        assert_eq!(
            foundry.edit_draft(edited),
            Err(CommandError::BlankDraft {
                fields: vec!["cognitiveRestructuring"],
            })
        );
        assert_eq!(foundry.session(), &before);
    }

    #[test]
    fn restart_returns_to_defaults() {
        let mut foundry = instant_foundry();
        foundry.submit_intent("test").expect("submit");
        foundry.begin_processing().expect("process");
        foundry.approve_draft().expect("approve");

        foundry.restart_session();
        assert_eq!(foundry.session(), &Session::new());
        foundry.submit_intent("a new goal").expect("submit again");
    }

    #[test]
    fn intent_cannot_change_mid_session() {
        let mut foundry = instant_foundry();
        foundry.submit_intent("test").expect("submit");
        foundry.begin_processing().expect("process");
        assert!(matches!(
            foundry.submit_intent("other"),
            Err(CommandError::InvalidStatus { .. })
        ));
        assert_eq!(foundry.session().intent(), "test");
    }
}
