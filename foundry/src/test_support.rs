//! Test-only helpers for constructing drafts, flags, notes and pacers.

use std::cell::RefCell;
use std::time::Duration;

use crate::commands::Foundry;
use crate::core::types::{CriticNote, Draft, Priority, SafetyFlag, Sections, Severity};
use crate::io::config::FoundryConfig;
use crate::io::pacer::{InstantPacer, Pacer, Stage};

const FILLER: &str = "Take a slow breath and notice the room around you. ";

/// Create a draft with explicit section texts and a fixed title.
pub fn draft_with(
    introduction: &str,
    cognitive_restructuring: &str,
    behavioral_activation: &str,
    exposure: &str,
    reflection: &str,
) -> Draft {
    Draft {
        title: "CBT Exercise: fixture".to_string(),
        sections: Sections {
            introduction: introduction.to_string(),
            cognitive_restructuring: cognitive_restructuring.to_string(),
            behavioral_activation: behavioral_activation.to_string(),
            exposure: exposure.to_string(),
            reflection: reflection.to_string(),
        },
    }
}

/// Create a draft whose introduction is `text` and whose other sections are
/// risk-free filler long enough to pass the minimum-content check.
pub fn padded_draft(text: &str) -> Draft {
    let filler = FILLER.repeat(2);
    draft_with(text, &filler, &filler, &filler, &filler)
}

pub fn flag(keyword: &str, severity: Severity) -> SafetyFlag {
    SafetyFlag {
        keyword: keyword.to_string(),
        context: format!("... {keyword} ..."),
        severity,
    }
}

pub fn note(section: &str, priority: Priority) -> CriticNote {
    CriticNote {
        section: section.to_string(),
        suggestion: format!("improve {section}"),
        priority,
    }
}

/// Foundry with default rules and no delays.
pub fn instant_foundry() -> Foundry<InstantPacer> {
    Foundry::new(&FoundryConfig::default(), InstantPacer).expect("foundry")
}

/// Pacer that records every requested pause instead of sleeping.
#[derive(Debug, Default)]
pub struct RecordingPacer {
    pauses: RefCell<Vec<(Stage, Duration)>>,
}

impl RecordingPacer {
    pub fn pauses(&self) -> Vec<(Stage, Duration)> {
        self.pauses.borrow().clone()
    }

    pub fn stages(&self) -> Vec<Stage> {
        self.pauses.borrow().iter().map(|(stage, _)| *stage).collect()
    }
}

impl Pacer for RecordingPacer {
    fn pause(&self, stage: Stage, duration: Duration) {
        self.pauses.borrow_mut().push((stage, duration));
    }
}
