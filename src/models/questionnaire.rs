//! Questionnaire schema: sections, questions and the flattened sequence
//! the conversation engine walks through.
//!
//! The schema is loaded once per session from a static JSON document and is
//! read-only afterwards. Only `id` and `prompt` are required per question;
//! everything else defaults to "no constraint / no follow-up".

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// How a follow-up-capable question decides whether to open its sub-dialogue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum TriggerMode {
    /// Fire only when at least one trigger substring occurs in the answer.
    #[default]
    AnyTrigger,
    /// Fire on any accepted answer, regardless of trigger matching.
    Always,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: String,
    pub prompt: String,
    /// Accepted-answer substrings; empty means any non-blank answer passes.
    #[serde(default)]
    pub expected_options: Vec<String>,
    /// Shown once when validation fails; a generic fallback is used if absent.
    #[serde(default)]
    pub clarification: Option<String>,
    #[serde(default)]
    pub has_follow_up: bool,
    /// Substrings that open the follow-up sub-dialogue (AnyTrigger mode).
    #[serde(default)]
    pub follow_up_triggers: Vec<String>,
    /// Prompt templates; `[CONDITION]` is replaced with the matched trigger.
    #[serde(default)]
    pub follow_up_questions: Vec<String>,
    #[serde(default)]
    pub trigger_mode: TriggerMode,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Section {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub icon: Option<String>,
    pub questions: Vec<Question>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Questionnaire {
    #[serde(default)]
    pub version: Option<String>,
    pub sections: Vec<Section>,
}

/// A question annotated with its owning section, as the engine iterates it.
#[derive(Debug, Clone)]
pub struct FlattenedQuestion {
    pub question: Question,
    pub section_title: String,
    pub section_icon: Option<String>,
}

impl Questionnaire {
    /// Parse a questionnaire from its JSON schema document.
    /// A schema with zero questions is rejected up front so the engine
    /// never has to handle an empty sequence.
    pub fn from_json(json: &str) -> Result<Self, SchemaError> {
        let questionnaire: Questionnaire =
            serde_json::from_str(json).map_err(|e| SchemaError::Parse(e.to_string()))?;
        if questionnaire.question_count() == 0 {
            return Err(SchemaError::NoQuestions);
        }
        Ok(questionnaire)
    }

    /// Load the schema from a file path.
    pub fn from_file(path: &Path) -> Result<Self, SchemaError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// The ordered flattened question sequence across all sections.
    pub fn flatten(&self) -> Vec<FlattenedQuestion> {
        self.sections
            .iter()
            .flat_map(|section| {
                section.questions.iter().map(|question| FlattenedQuestion {
                    question: question.clone(),
                    section_title: section.title.clone(),
                    section_icon: section.icon.clone(),
                })
            })
            .collect()
    }

    pub fn question_count(&self) -> usize {
        self.sections.iter().map(|s| s.questions.len()).sum()
    }
}

/// Errors loading the questionnaire schema. None of these are recoverable
/// within a session; the host shows a "please refresh" message.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("I/O error reading questionnaire: {0}")]
    Io(#[from] std::io::Error),

    #[error("Questionnaire JSON is malformed: {0}")]
    Parse(String),

    #[error("Questionnaire contains no questions")]
    NoQuestions,
}
