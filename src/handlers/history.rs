use axum::{
    extract::{Query, State},
    Json,
};

use crate::dto::{HistoryQuery, HistoryResponse};
use crate::error::{AppError, AppResult};
use crate::AppState;

pub async fn get_history(
    State(state): State<AppState>,
    Query(query): Query<HistoryQuery>,
) -> AppResult<Json<HistoryResponse>> {
    let recent = query.recent.unwrap_or(state.config.recent_entries);

    let mood_log = state.mood_log.clone();
    let rows = tokio::task::spawn_blocking(move || mood_log.read_all())
        .await
        .map_err(|e| AppError::Internal(e.into()))??;

    tracing::debug!(rows = rows.len(), recent, "Mood history loaded");

    Ok(Json(HistoryResponse::from_rows(rows, recent)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::history::HistoryRow;
    use crate::services::model_client::ScriptedModel;
    use crate::services::mood_log::{CsvMoodLog, MemoryMoodLog};
    use axum::{body::Body, http::Request, http::StatusCode};
    use chrono::NaiveDate;
    use http_body_util::BodyExt;
    use serde_json::Value;
    use std::sync::Arc;
    use tower::ServiceExt;

    fn row(day: u32, mood: &str, score: i64) -> HistoryRow {
        HistoryRow {
            date: NaiveDate::from_ymd_opt(2026, 10, day).unwrap(),
            mood: mood.into(),
            score,
        }
    }

    async fn get_history_json(state: AppState, uri: &str) -> (StatusCode, Value) {
        let resp = crate::router(state)
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = resp.status();
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_empty_history_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let log = Arc::new(CsvMoodLog::open(dir.path().join("mood_history.csv")).unwrap());
        let state = AppState::for_tests(ScriptedModel::replying(vec![]), log);

        let (status, body) = get_history_json(state, "/api/history").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["is_empty"], true);
        assert_eq!(body["entries"].as_array().unwrap().len(), 0);
        assert_eq!(body["recent"].as_array().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn test_history_returns_last_five_in_file_order() {
        let rows = vec![
            row(1, "Sad", 1),
            row(2, "Anxious", 2),
            row(2, "Neutral", 3),
            row(3, "Productive", 4),
            row(4, "Happy", 5),
            row(5, "Neutral", 3),
        ];
        let state = AppState::for_tests(
            ScriptedModel::replying(vec![]),
            Arc::new(MemoryMoodLog::with_rows(rows)),
        );

        let (status, body) = get_history_json(state, "/api/history").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["is_empty"], false);
        assert_eq!(body["entries"].as_array().unwrap().len(), 6);

        let recent_moods: Vec<&str> = body["recent"]
            .as_array()
            .unwrap()
            .iter()
            .map(|e| e["mood"].as_str().unwrap())
            .collect();
        assert_eq!(
            recent_moods,
            vec!["Anxious", "Neutral", "Productive", "Happy", "Neutral"]
        );

        assert_eq!(body["trend"][0]["date"], "2026-10-01");
        assert_eq!(body["trend"][0]["score"], 1);
    }

    #[tokio::test]
    async fn test_history_recent_query_override() {
        let rows = (1..=4).map(|d| row(d, "Happy", 5)).collect();
        let state = AppState::for_tests(
            ScriptedModel::replying(vec![]),
            Arc::new(MemoryMoodLog::with_rows(rows)),
        );

        let (_, body) = get_history_json(state, "/api/history?recent=2").await;

        let recent = body["recent"].as_array().unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0]["date"], "2026-10-03");
        assert_eq!(recent[1]["date"], "2026-10-04");
    }

    #[tokio::test]
    async fn test_malformed_log_is_a_server_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mood_history.csv");
        std::fs::write(&path, "Date,Mood,Score\nnot-a-date,Sad,1\n").unwrap();
        let log = Arc::new(CsvMoodLog::open(&path).unwrap());
        let state = AppState::for_tests(ScriptedModel::replying(vec![]), log);

        let (status, body) = get_history_json(state, "/api/history").await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"]["message"], "Internal server error");
    }
}
