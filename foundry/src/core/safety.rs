//! Keyword-based safety scanning.
//!
//! The keyword table and its severity tiers are plain data so a ruleset can be
//! swapped or tested on its own. Matching is whole-word and case-insensitive
//! over the concatenation of all section texts.

use anyhow::{Context, Result, anyhow};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::core::types::{Draft, SafetyFlag, Severity};

/// Default risk keywords in scan order.
pub const KEYWORD_TABLE: &[(&str, Severity)] = &[
    ("hurt", Severity::Medium),
    ("kill", Severity::High),
    ("harm", Severity::Medium),
    ("death", Severity::Medium),
    ("suicide", Severity::High),
    ("die", Severity::Low),
    ("weapon", Severity::High),
    ("violence", Severity::Low),
];

/// Keyword emitted when the draft is too short to judge.
pub const INSUFFICIENT_CONTENT: &str = "insufficient_content";
const INSUFFICIENT_CONTENT_CONTEXT: &str = "Draft is too brief";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct KeywordRule {
    pub keyword: String,
    pub severity: Severity,
}

/// Scanner ruleset (TOML section `[safety]`).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SafetyRules {
    /// Characters kept on each side of the first match.
    pub context_radius: usize,
    /// Concatenated texts shorter than this get an `insufficient_content` flag.
    pub min_content_chars: usize,
    pub keywords: Vec<KeywordRule>,
}

impl Default for SafetyRules {
    fn default() -> Self {
        Self {
            context_radius: 30,
            min_content_chars: 200,
            keywords: KEYWORD_TABLE
                .iter()
                .map(|(keyword, severity)| KeywordRule {
                    keyword: (*keyword).to_string(),
                    severity: *severity,
                })
                .collect(),
        }
    }
}

impl SafetyRules {
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for rule in &self.keywords {
            let keyword = rule.keyword.trim();
            if keyword.is_empty() {
                return Err(anyhow!("safety.keywords must not contain empty keywords"));
            }
            if keyword != rule.keyword {
                return Err(anyhow!(
                    "safety.keywords entry '{}' has surrounding whitespace",
                    rule.keyword
                ));
            }
            if !seen.insert(keyword.to_lowercase()) {
                return Err(anyhow!("duplicate safety keyword '{keyword}'"));
            }
        }
        Ok(())
    }
}

/// Compiled scanner. Construction validates the rules and builds one pattern
/// per keyword.
#[derive(Debug, Clone)]
pub struct SafetyScanner {
    patterns: Vec<(KeywordRule, Regex)>,
    context_radius: usize,
    min_content_chars: usize,
}

impl SafetyScanner {
    pub fn new(rules: &SafetyRules) -> Result<Self> {
        rules.validate()?;
        let patterns = rules
            .keywords
            .iter()
            .map(|rule| {
                let keyword = rule.keyword.to_lowercase();
                let pattern = format!(r"(?i)\b{}\b", regex::escape(&keyword));
                let regex = Regex::new(&pattern)
                    .with_context(|| format!("compile pattern for '{}'", rule.keyword))?;
                Ok((
                    KeywordRule {
                        keyword,
                        severity: rule.severity,
                    },
                    regex,
                ))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            patterns,
            context_radius: rules.context_radius,
            min_content_chars: rules.min_content_chars,
        })
    }

    /// Return one flag per matched keyword in table order, followed by the
    /// synthetic `insufficient_content` flag when the text is too short.
    pub fn scan(&self, draft: &Draft) -> Vec<SafetyFlag> {
        let text = draft.sections.joined().to_lowercase();
        let mut flags: Vec<SafetyFlag> = self
            .patterns
            .iter()
            .filter_map(|(rule, regex)| {
                let found = regex.find(&text)?;
                Some(SafetyFlag {
                    keyword: rule.keyword.clone(),
                    context: context_window(&text, found.start(), found.end(), self.context_radius),
                    severity: rule.severity,
                })
            })
            .collect();

        if text.chars().count() < self.min_content_chars {
            flags.push(SafetyFlag {
                keyword: INSUFFICIENT_CONTENT.to_string(),
                context: INSUFFICIENT_CONTENT_CONTEXT.to_string(),
                severity: Severity::Medium,
            });
        }
        flags
    }
}

/// Slice `radius` characters before `start` and after `end`, clipped to the text.
fn context_window(text: &str, start: usize, end: usize, radius: usize) -> String {
    let from = text[..start]
        .char_indices()
        .rev()
        .take(radius)
        .last()
        .map_or(start, |(idx, _)| idx);
    let to = text[end..]
        .char_indices()
        .nth(radius)
        .map_or(text.len(), |(idx, _)| end + idx);
    text[from..to].to_string()
}
