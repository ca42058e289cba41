use axum::{extract::State, http::StatusCode, Json};
use serde_json::{json, Value};

use crate::AppState;

pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "mindful-journal-api",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

pub async fn readyz(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    let mood_log = state.mood_log.clone();
    let log_ok = matches!(
        tokio::task::spawn_blocking(move || mood_log.read_all()).await,
        Ok(Ok(_))
    );
    let model = if state.config.model_configured() {
        "configured"
    } else {
        "missing_api_key"
    };

    if log_ok {
        (
            StatusCode::OK,
            Json(json!({
                "status": "ready",
                "checks": {
                    "mood_log": "ok",
                    "model": model,
                    "model_client": state.analyzer.model_name(),
                },
            })),
        )
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "status": "not_ready",
                "checks": {
                    "mood_log": "failed",
                    "model": model,
                    "model_client": state.analyzer.model_name(),
                },
            })),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::model_client::ScriptedModel;
    use crate::services::mood_log::{MemoryMoodLog, MoodLog, StorageError};
    use crate::models::history::HistoryRow;
    use axum::{body::Body, http::Request};
    use http_body_util::BodyExt;
    use std::sync::Arc;
    use tower::ServiceExt;

    struct BrokenLog;

    impl MoodLog for BrokenLog {
        fn append(&self, _row: &HistoryRow) -> Result<(), StorageError> {
            Err(std::io::Error::other("read-only").into())
        }

        fn read_all(&self) -> Result<Vec<HistoryRow>, StorageError> {
            Err(std::io::Error::other("gone").into())
        }
    }

    async fn get_json(state: AppState, uri: &str) -> (StatusCode, Value) {
        let resp = crate::router(state)
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = resp.status();
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_health_check() {
        let state = AppState::for_tests(
            ScriptedModel::replying(vec![]),
            Arc::new(MemoryMoodLog::default()),
        );
        let (status, body) = get_json(state, "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["service"], "mindful-journal-api");
    }

    #[tokio::test]
    async fn test_readyz_ok_without_api_key() {
        let state = AppState::for_tests(
            ScriptedModel::replying(vec![]),
            Arc::new(MemoryMoodLog::default()),
        );
        let (status, body) = get_json(state, "/readyz").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["checks"]["mood_log"], "ok");
        assert_eq!(body["checks"]["model"], "missing_api_key");
        assert_eq!(body["checks"]["model_client"], "scripted");
    }

    #[tokio::test]
    async fn test_readyz_reports_unreadable_log() {
        let state = AppState::for_tests(ScriptedModel::replying(vec![]), Arc::new(BrokenLog));
        let (status, body) = get_json(state, "/readyz").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["checks"]["mood_log"], "failed");
    }
}
