//! Heuristic quality review of a draft.
//!
//! Every rule is evaluated on every call; the returned notes keep rule
//! declaration order.

use std::sync::LazyLock;

use anyhow::{Result, anyhow};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::core::types::{CriticNote, Draft, Priority, SafetyFlag};

/// Words that signal the draft addresses the reader directly.
pub const EMPATHY_MARKERS: &[&str] = &["you", "your", "feel", "experience", "journey"];

static EMPATHY_RE: LazyLock<Regex> = LazyLock::new(|| {
    let alternation = EMPATHY_MARKERS.join("|");
    Regex::new(&format!(r"(?i)\b(?:{alternation})\b")).expect("empathy pattern is valid")
});

/// Critic thresholds (TOML section `[critic]`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CriticRules {
    pub min_introduction_chars: usize,
    pub min_activation_lines: usize,
}

impl Default for CriticRules {
    fn default() -> Self {
        Self {
            min_introduction_chars: 100,
            min_activation_lines: 5,
        }
    }
}

impl CriticRules {
    pub fn validate(&self) -> Result<()> {
        if self.min_activation_lines == 0 {
            return Err(anyhow!("critic.min_activation_lines must be > 0"));
        }
        Ok(())
    }
}

/// Review `draft` given the flags raised for it in the same cycle.
pub fn critique(rules: &CriticRules, draft: &Draft, flags: &[SafetyFlag]) -> Vec<CriticNote> {
    [
        short_introduction(rules, draft),
        missing_empathy(draft),
        reflection_without_questions(draft),
        safety_concerns(flags),
        thin_activation_plan(rules, draft),
    ]
    .into_iter()
    .flatten()
    .collect()
}

fn short_introduction(rules: &CriticRules, draft: &Draft) -> Option<CriticNote> {
    (draft.sections.introduction.chars().count() < rules.min_introduction_chars).then(|| {
        note(
            "introduction",
            "Introduction could be more detailed. Consider adding more context about the therapeutic approach.",
            Priority::Medium,
        )
    })
}

fn missing_empathy(draft: &Draft) -> Option<CriticNote> {
    (!EMPATHY_RE.is_match(&draft.sections.joined())).then(|| {
        note(
            "overall",
            "Add more empathetic language. Use \"you\" statements and acknowledge the user's emotional experience.",
            Priority::High,
        )
    })
}

fn reflection_without_questions(draft: &Draft) -> Option<CriticNote> {
    (!draft.sections.reflection.contains('?')).then(|| {
        note(
            "reflection",
            "Add reflective questions to encourage deeper self-exploration.",
            Priority::Medium,
        )
    })
}

fn safety_concerns(flags: &[SafetyFlag]) -> Option<CriticNote> {
    (!flags.is_empty()).then(|| {
        note(
            "safety",
            &format!(
                "Safety concerns detected ({} flags). Review content for potentially harmful language.",
                flags.len()
            ),
            Priority::High,
        )
    })
}

fn thin_activation_plan(rules: &CriticRules, draft: &Draft) -> Option<CriticNote> {
    let lines = draft.sections.behavioral_activation.split('\n').count();
    (lines < rules.min_activation_lines).then(|| {
        note(
            "behavioralActivation",
            "Behavioral activation section needs more actionable steps.",
            Priority::Low,
        )
    })
}

fn note(section: &str, suggestion: &str, priority: Priority) -> CriticNote {
    CriticNote {
        section: section.to_string(),
        suggestion: suggestion.to_string(),
        priority,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::Severity;
    use crate::test_support::{draft_with, flag};

    fn sections(notes: &[CriticNote]) -> Vec<(&str, Priority)> {
        notes
            .iter()
            .map(|n| (n.section.as_str(), n.priority))
            .collect()
    }

    fn healthy_draft() -> Draft {
        draft_with(
            &"This exercise helps you look at a situation from several angles. ".repeat(2),
            "1. Notice the thought",
            "a\nb\nc\nd\ne",
            "Stay with it",
            "What did you notice?",
        )
    }

    #[test]
    fn healthy_draft_has_no_notes() {
        assert!(critique(&CriticRules::default(), &healthy_draft(), &[]).is_empty());
    }

    #[test]
    fn all_rules_fire_in_declaration_order() {
        let draft = draft_with("Short.", "Think.", "One line", "Stay.", "Reflect.");
        let flags = vec![flag("kill", Severity::High), flag("die", Severity::Low)];
        let notes = critique(&CriticRules::default(), &draft, &flags);
        assert_eq!(
            sections(&notes),
            vec![
                ("introduction", Priority::Medium),
                ("overall", Priority::High),
                ("reflection", Priority::Medium),
                ("safety", Priority::High),
                ("behavioralActivation", Priority::Low),
            ]
        );
    }

    #[test]
    fn safety_note_reports_flag_count() {
        let flags = vec![
            flag("kill", Severity::High),
            flag("harm", Severity::Medium),
            flag("die", Severity::Low),
        ];
        let notes = critique(&CriticRules::default(), &healthy_draft(), &flags);
        assert_eq!(notes.len(), 1);
        assert!(notes[0].suggestion.contains("(3 flags)"));
    }

    #[test]
    fn empathy_markers_match_whole_words_anywhere() {
        let mut draft = draft_with("Plain text.", "Young trees.", "a", "b", "c");
        let notes = critique(&CriticRules::default(), &draft, &[]);
        assert!(notes.iter().any(|n| n.section == "overall"));

        draft.sections.exposure = "How does this FEEL today".to_string();
        let notes = critique(&CriticRules::default(), &draft, &[]);
        assert!(!notes.iter().any(|n| n.section == "overall"));
    }

    #[test]
    fn thresholds_come_from_rules() {
        let rules = CriticRules {
            min_introduction_chars: 1,
            min_activation_lines: 1,
        };
        let draft = draft_with("Hi you", "a", "one line", "b", "Why?");
        assert!(critique(&rules, &draft, &[]).is_empty());
    }

    #[test]
    fn critique_is_idempotent() {
        let draft = draft_with("Short.", "a", "b", "c", "d");
        let flags = vec![flag("weapon", Severity::High)];
        let rules = CriticRules::default();
        assert_eq!(
            critique(&rules, &draft, &flags),
            critique(&rules, &draft, &flags)
        );
    }
}
