//! Session state store.
//!
//! A [`Session`] is the single owner of everything a refinement run produces.
//! Fields are private; every mutation goes through a named operation so the
//! store can keep its invariants:
//!
//! - the draft archive and activity log only grow (until [`Session::reset`]),
//! - the iteration counter is monotonic,
//! - flag and note lists are replaced wholesale, never edited in place.

use chrono::Utc;
use serde::Serialize;
use tracing::debug;

use crate::core::types::{
    Agent, CriticNote, Draft, LogEntry, LogKind, Page, SafetyFlag, Status,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    intent: String,
    draft: Option<Draft>,
    previous_drafts: Vec<Draft>,
    logs: Vec<LogEntry>,
    safety_flags: Vec<SafetyFlag>,
    critic_notes: Vec<CriticNote>,
    revision_feedback: Vec<String>,
    iteration: u32,
    status: Status,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            intent: String::new(),
            draft: None,
            previous_drafts: Vec::new(),
            logs: Vec::new(),
            safety_flags: Vec::new(),
            critic_notes: Vec::new(),
            revision_feedback: Vec::new(),
            iteration: 0,
            status: Status::Idle,
        }
    }
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn intent(&self) -> &str {
        &self.intent
    }

    /// Current draft; `None` before the first cycle.
    pub fn draft(&self) -> Option<&Draft> {
        self.draft.as_ref()
    }

    /// Every generated draft, oldest first. Includes the current one.
    pub fn previous_drafts(&self) -> &[Draft] {
        &self.previous_drafts
    }

    pub fn logs(&self) -> &[LogEntry] {
        &self.logs
    }

    pub fn safety_flags(&self) -> &[SafetyFlag] {
        &self.safety_flags
    }

    pub fn critic_notes(&self) -> &[CriticNote] {
        &self.critic_notes
    }

    /// Accepted revision requests, oldest first.
    pub fn revision_feedback(&self) -> &[String] {
        &self.revision_feedback
    }

    /// Latest accepted revision request, if any.
    pub fn latest_feedback(&self) -> Option<&str> {
        self.revision_feedback.last().map(String::as_str)
    }

    pub fn iteration(&self) -> u32 {
        self.iteration
    }

    pub fn status(&self) -> Status {
        self.status
    }

    /// View selector derived from [`Session::status`].
    pub fn current_page(&self) -> Page {
        Page::from(self.status)
    }

    pub(crate) fn set_intent(&mut self, intent: String) {
        self.intent = intent;
    }

    /// Advance the iteration counter and return the new value.
    pub(crate) fn begin_iteration(&mut self) -> u32 {
        self.iteration += 1;
        self.iteration
    }

    /// Make `draft` current and append it to the archive.
    pub(crate) fn record_draft(&mut self, draft: Draft) {
        self.previous_drafts.push(draft.clone());
        self.draft = Some(draft);
    }

    /// Replace the current draft without archiving it (human edits).
    pub(crate) fn replace_draft(&mut self, draft: Draft) {
        self.draft = Some(draft);
    }

    pub(crate) fn replace_safety_flags(&mut self, flags: Vec<SafetyFlag>) {
        self.safety_flags = flags;
    }

    pub(crate) fn replace_critic_notes(&mut self, notes: Vec<CriticNote>) {
        self.critic_notes = notes;
    }

    pub(crate) fn push_feedback(&mut self, feedback: String) {
        self.revision_feedback.push(feedback);
    }

    pub(crate) fn set_status(&mut self, status: Status) {
        if self.status != status {
            debug!(from = self.status.as_str(), to = status.as_str(), "status change");
        }
        self.status = status;
    }

    /// Append an activity log entry stamped with the current time.
    pub(crate) fn log(&mut self, agent: Agent, kind: LogKind, message: impl Into<String>) {
        let message = message.into();
        debug!(agent = agent.as_str(), ?kind, %message, "activity");
        self.logs.push(LogEntry {
            timestamp: Utc::now(),
            agent,
            message,
            kind,
        });
    }

    /// Discard every field and return to the initial defaults.
    pub(crate) fn reset(&mut self) {
        *self = Self::default();
    }
}
