use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::reflection::ReflectionRecord;

/// One line of the mood log. Column names match the file header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryRow {
    #[serde(rename = "Date")]
    pub date: NaiveDate,
    #[serde(rename = "Mood")]
    pub mood: String,
    #[serde(rename = "Score")]
    pub score: i64,
}

impl HistoryRow {
    pub fn from_record(date: NaiveDate, record: &ReflectionRecord) -> Self {
        Self {
            date,
            mood: record.mood.clone(),
            score: record.score,
        }
    }
}
