//! Shared deterministic types for the refinement core.
//!
//! These types define stable contracts between the agents, the session store
//! and observers. They carry no behavior beyond small accessors and must stay
//! deterministic across runs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The five fixed sections of a generated exercise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sections {
    pub introduction: String,
    pub cognitive_restructuring: String,
    pub behavioral_activation: String,
    pub exposure: String,
    pub reflection: String,
}

impl Sections {
    /// Section texts in declaration order, paired with their wire names.
    pub fn named(&self) -> [(&'static str, &str); 5] {
        [
            ("introduction", &self.introduction),
            ("cognitiveRestructuring", &self.cognitive_restructuring),
            ("behavioralActivation", &self.behavioral_activation),
            ("exposure", &self.exposure),
            ("reflection", &self.reflection),
        ]
    }

    /// All section texts joined by a single space.
    pub fn joined(&self) -> String {
        self.named()
            .iter()
            .map(|(_, text)| *text)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// A generated exercise document. Replaced wholesale every cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Draft {
    pub title: String,
    pub sections: Sections,
}

impl Draft {
    /// Names of fields that are empty after trimming (`title` or a section).
    pub fn blank_fields(&self) -> Vec<&'static str> {
        let mut blank = Vec::new();
        if self.title.trim().is_empty() {
            blank.push("title");
        }
        for (name, text) in self.sections.named() {
            if text.trim().is_empty() {
                blank.push(name);
            }
        }
        blank
    }
}

/// Severity tier assigned to a safety flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
        }
    }
}

/// Priority of a critic note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
}

/// A detected risk indicator, regenerated every cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SafetyFlag {
    pub keyword: String,
    pub context: String,
    pub severity: Severity,
}

/// A heuristic improvement suggestion, regenerated every cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CriticNote {
    pub section: String,
    pub suggestion: String,
    pub priority: Priority,
}

/// Which supervisor rule ended the automatic loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HaltRule {
    MaxIterations,
    QualityThreshold,
    AcceptableQuality,
}

/// Supervisor decision for the iteration just completed.
///
/// `halt` is `None` when the loop should continue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Verdict {
    pub should_continue: bool,
    pub reason: String,
    pub halt: Option<HaltRule>,
}

/// Emitter of an activity log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Agent {
    Drafter,
    Safety,
    Critic,
    Supervisor,
    System,
}

impl Agent {
    pub fn as_str(self) -> &'static str {
        match self {
            Agent::Drafter => "Drafter",
            Agent::Safety => "Safety",
            Agent::Critic => "Critic",
            Agent::Supervisor => "Supervisor",
            Agent::System => "System",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogKind {
    Info,
    Warning,
    Error,
    Success,
}

/// One activity log line. Entries are append-only and kept in emission order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub agent: Agent,
    pub message: String,
    #[serde(rename = "type")]
    pub kind: LogKind,
}

/// Lifecycle status of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Idle,
    Drafting,
    Paused,
    Final,
}

impl Status {
    pub fn as_str(self) -> &'static str {
        match self {
            Status::Idle => "idle",
            Status::Drafting => "drafting",
            Status::Paused => "paused",
            Status::Final => "final",
        }
    }
}

/// View selector for a presentation layer. Derived from [`Status`] only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Page {
    Home,
    Processing,
    Review,
    Final,
}

impl From<Status> for Page {
    fn from(status: Status) -> Self {
        match status {
            Status::Idle => Page::Home,
            Status::Drafting => Page::Processing,
            Status::Paused => Page::Review,
            Status::Final => Page::Final,
        }
    }
}
