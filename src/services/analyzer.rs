//! Journal text → `{response, mood, score}`.
//!
//! One model call per entry, then a three-stage recovery of the record:
//! strict JSON parse of the cleaned reply, parse of the outermost `{...}`
//! span, and finally the fixed fallback record. [`EntryAnalyzer::analyze`]
//! never fails; the [`Analysis`] it returns says which stage produced the
//! record.

use serde::Serialize;
use std::sync::Arc;

use crate::models::reflection::{Mood, ReflectionRecord};
use crate::services::model_client::ModelClient;

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("reply contains no JSON object")]
    NoObject,

    #[error("reply is not a valid reflection record: {0}")]
    Invalid(#[from] serde_json::Error),
}

/// Which parse stage recovered the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseStage {
    Strict,
    Extracted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackReason {
    /// Reply could not be parsed even after extraction.
    Unparseable,
    /// The model call itself failed.
    ModelUnavailable,
    /// Parsed, but rejected by strict validation.
    Rejected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "stage", content = "reason", rename_all = "snake_case")]
pub enum AnalysisOutcome {
    Parsed,
    Extracted,
    Fallback(FallbackReason),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Analysis {
    pub record: ReflectionRecord,
    pub outcome: AnalysisOutcome,
}

impl Analysis {
    fn fallback(reason: FallbackReason) -> Self {
        Self {
            record: ReflectionRecord::fallback(),
            outcome: AnalysisOutcome::Fallback(reason),
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self.outcome, AnalysisOutcome::Fallback(_))
    }

    pub fn source(&self) -> &'static str {
        if self.is_fallback() {
            "fallback"
        } else {
            "model"
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ValidationPolicy {
    /// Pass parsed records through as the model sent them.
    #[default]
    Permissive,
    /// Replace records with an unknown mood or a mismatched score by the fallback.
    Strict,
}

pub struct EntryAnalyzer {
    model: Arc<dyn ModelClient>,
    policy: ValidationPolicy,
}

impl EntryAnalyzer {
    pub fn new(model: Arc<dyn ModelClient>, policy: ValidationPolicy) -> Self {
        Self { model, policy }
    }

    pub fn model_name(&self) -> &str {
        self.model.name()
    }

    /// Callers reject empty text before getting here.
    pub async fn analyze(&self, text: &str) -> Analysis {
        let prompt = build_prompt(text);

        let raw = match self.model.generate(&prompt).await {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(
                    model = self.model.name(),
                    error = %e,
                    "Model call failed, using fallback reflection"
                );
                return Analysis::fallback(FallbackReason::ModelUnavailable);
            }
        };

        let (record, stage) = match parse_reply(&raw) {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!(
                    reply_len = raw.len(),
                    error = %e,
                    "Model reply unparseable, using fallback reflection"
                );
                return Analysis::fallback(FallbackReason::Unparseable);
            }
        };

        if self.policy == ValidationPolicy::Strict && !record.is_consistent() {
            tracing::warn!(
                mood = %record.mood,
                score = record.score,
                "Reflection rejected by strict validation"
            );
            return Analysis::fallback(FallbackReason::Rejected);
        }

        tracing::debug!(mood = %record.mood, score = record.score, ?stage, "Entry analyzed");

        Analysis {
            record,
            outcome: match stage {
                ParseStage::Strict => AnalysisOutcome::Parsed,
                ParseStage::Extracted => AnalysisOutcome::Extracted,
            },
        }
    }
}

pub fn build_prompt(text: &str) -> String {
    let moods = Mood::ALL
        .iter()
        .map(|m| format!("{}({})", m.label(), m.score()))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        r#"Analyze this journal entry: "{text}".
Return ONLY a JSON-style response: {{"response": "empathetic text", "mood": "One-word Mood", "score": 1-5}}
Moods: {moods}."#
    )
}

/// Removes every ```json / ``` marker, wherever it appears.
pub fn strip_code_fences(raw: &str) -> String {
    raw.replace("```json", "").replace("```", "").trim().to_string()
}

/// Greedy span from the first `{` to the last `}`.
fn outermost_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

pub fn parse_reply(raw: &str) -> Result<(ReflectionRecord, ParseStage), ParseError> {
    let cleaned = strip_code_fences(raw);

    if let Ok(record) = serde_json::from_str::<ReflectionRecord>(&cleaned) {
        return Ok((record, ParseStage::Strict));
    }

    let object = outermost_object(&cleaned).ok_or(ParseError::NoObject)?;
    let record = serde_json::from_str::<ReflectionRecord>(object)?;
    Ok((record, ParseStage::Extracted))
}
