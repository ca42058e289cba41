//! # Mindful Journal — Request/Response DTOs
//!
//! Conventions:
//! - `*Request`  → deserialized from client JSON body or query params
//! - `*Response` → serialized to client JSON
//! - Field-level checks use `validator` derive macros; limits that come from
//!   `Config` are checked in the handler

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::models::history::HistoryRow;
use crate::services::analyzer::{Analysis, AnalysisOutcome};

pub const EMPTY_ENTRY_MESSAGE: &str = "Write something first!";

// ============================================================================
// Entries
// ============================================================================

/// POST /api/entries
#[derive(Debug, Deserialize, Validate)]
pub struct CreateEntryRequest {
    #[validate(custom = "validate_not_blank")]
    pub text: String,
}

fn validate_not_blank(text: &str) -> Result<(), ValidationError> {
    if text.trim().is_empty() {
        let mut err = ValidationError::new("blank");
        err.message = Some(Cow::Borrowed(EMPTY_ENTRY_MESSAGE));
        return Err(err);
    }
    Ok(())
}

/// First human-readable message out of a `validator` error set.
pub fn first_validation_message(errors: &ValidationErrors) -> String {
    errors
        .field_errors()
        .values()
        .flat_map(|errs| errs.iter())
        .find_map(|e| e.message.as_ref().map(|m| m.to_string()))
        .unwrap_or_else(|| errors.to_string())
}

/// Response for a submitted reflection
#[derive(Debug, Serialize)]
pub struct EntryResponse {
    pub response: String,
    pub mood: String,
    pub score: i64,
    pub date: NaiveDate,
    /// "model" or "fallback"
    pub source: &'static str,
    pub outcome: AnalysisOutcome,
}

impl EntryResponse {
    pub fn new(analysis: Analysis, date: NaiveDate) -> Self {
        let source = analysis.source();
        Self {
            response: analysis.record.response,
            mood: analysis.record.mood,
            score: analysis.record.score,
            date,
            source,
            outcome: analysis.outcome,
        }
    }
}

// ============================================================================
// History
// ============================================================================

/// GET /api/history
#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    /// How many trailing rows to return in `recent`. Default: `RECENT_ENTRIES`
    pub recent: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryEntry {
    pub date: NaiveDate,
    pub mood: String,
    pub score: i64,
}

impl From<HistoryRow> for HistoryEntry {
    fn from(row: HistoryRow) -> Self {
        Self {
            date: row.date,
            mood: row.mood,
            score: row.score,
        }
    }
}

/// One point of the Date → Score trend chart
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendPoint {
    pub date: NaiveDate,
    pub score: i64,
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub is_empty: bool,
    pub entries: Vec<HistoryEntry>,
    pub trend: Vec<TrendPoint>,
    pub recent: Vec<HistoryEntry>,
}

impl HistoryResponse {
    /// `recent` is the last `recent` rows, still in file order.
    pub fn from_rows(rows: Vec<HistoryRow>, recent: usize) -> Self {
        let entries: Vec<HistoryEntry> = rows.into_iter().map(HistoryEntry::from).collect();
        let trend = entries
            .iter()
            .map(|e| TrendPoint {
                date: e.date,
                score: e.score,
            })
            .collect();
        let tail_start = entries.len().saturating_sub(recent);
        let recent = entries[tail_start..].to_vec();

        Self {
            is_empty: entries.is_empty(),
            entries,
            trend,
            recent,
        }
    }
}
