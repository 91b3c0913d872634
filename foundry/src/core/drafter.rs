//! Templated exercise generation.
//!
//! The drafter renders five fixed section templates with the session intent.
//! Output depends only on the request, so identical requests yield identical
//! drafts.

use anyhow::{Context, Result};
use minijinja::{Environment, context};
use serde::{Deserialize, Serialize};

use crate::core::types::{Draft, Sections};

const INTRODUCTION_TEMPLATE: &str = include_str!("templates/introduction.txt");
const COGNITIVE_RESTRUCTURING_TEMPLATE: &str = include_str!("templates/cognitive_restructuring.txt");
const BEHAVIORAL_ACTIVATION_TEMPLATE: &str = include_str!("templates/behavioral_activation.txt");
const EXPOSURE_TEMPLATE: &str = include_str!("templates/exposure.txt");
const REFLECTION_TEMPLATE: &str = include_str!("templates/reflection.txt");

const TITLE_PREFIX: &str = "CBT Exercise: ";

/// Tunables for draft generation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct DrafterOptions {
    /// Maximum number of intent characters copied into the title.
    pub title_max_chars: usize,
}

impl Default for DrafterOptions {
    fn default() -> Self {
        Self {
            title_max_chars: 50,
        }
    }
}

/// Input for one generation pass.
#[derive(Debug, Clone, Copy)]
pub struct DraftRequest<'a> {
    pub intent: &'a str,
    /// Latest reviewer feedback, rendered into the introduction when present.
    pub feedback: Option<&'a str>,
}

/// Section template engine.
pub struct Drafter {
    env: Environment<'static>,
    options: DrafterOptions,
}

impl Drafter {
    pub fn new(options: DrafterOptions) -> Result<Self> {
        Self::from_sources(
            options,
            [
                ("introduction", INTRODUCTION_TEMPLATE),
                ("cognitive_restructuring", COGNITIVE_RESTRUCTURING_TEMPLATE),
                ("behavioral_activation", BEHAVIORAL_ACTIVATION_TEMPLATE),
                ("exposure", EXPOSURE_TEMPLATE),
                ("reflection", REFLECTION_TEMPLATE),
            ],
        )
    }

    /// Build from explicit `(section, source)` templates.
    pub(crate) fn from_sources(
        options: DrafterOptions,
        templates: [(&'static str, &'static str); 5],
    ) -> Result<Self> {
        let mut env = Environment::new();
        for (name, source) in templates {
            env.add_template(name, source)
                .with_context(|| format!("parse {name} template"))?;
        }
        Ok(Self { env, options })
    }

    /// Render a draft for `request`.
    pub fn draft(&self, request: &DraftRequest<'_>) -> Result<Draft> {
        let intent = request.intent.trim();
        let feedback = request.feedback.map(str::trim).filter(|s| !s.is_empty());

        let sections = Sections {
            introduction: self.render("introduction", intent, feedback)?,
            cognitive_restructuring: self.render("cognitive_restructuring", intent, None)?,
            behavioral_activation: self.render("behavioral_activation", intent, None)?,
            exposure: self.render("exposure", intent, None)?,
            reflection: self.render("reflection", intent, None)?,
        };

        Ok(Draft {
            title: self.title(intent),
            sections,
        })
    }

    fn title(&self, intent: &str) -> String {
        let truncated: String = intent.chars().take(self.options.title_max_chars).collect();
        format!("{TITLE_PREFIX}{truncated}")
    }

    fn render(&self, name: &str, intent: &str, feedback: Option<&str>) -> Result<String> {
        let template = self.env.get_template(name)?;
        template
            .render(context! { intent => intent, feedback => feedback })
            .with_context(|| format!("render {name} template"))
    }
}
