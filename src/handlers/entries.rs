use axum::{extract::State, http::StatusCode, Json};
use chrono::Local;
use validator::Validate;

use crate::dto::{first_validation_message, CreateEntryRequest, EntryResponse};
use crate::error::{AppError, AppResult};
use crate::models::history::HistoryRow;
use crate::AppState;

pub async fn create_entry(
    State(state): State<AppState>,
    Json(body): Json<CreateEntryRequest>,
) -> AppResult<(StatusCode, Json<EntryResponse>)> {
    body.validate()
        .map_err(|e| AppError::Validation(first_validation_message(&e)))?;

    let max_chars = state.config.max_entry_chars;
    if body.text.chars().count() as u64 > max_chars {
        return Err(AppError::Validation(format!(
            "Entry must be at most {} characters",
            max_chars
        )));
    }

    let analysis = state.analyzer.analyze(&body.text).await;

    // Local calendar day, same as the user's wall clock
    let date = Local::now().date_naive();
    let row = HistoryRow::from_record(date, &analysis.record);

    let mood_log = state.mood_log.clone();
    tokio::task::spawn_blocking(move || mood_log.append(&row))
        .await
        .map_err(|e| AppError::Internal(e.into()))??;

    tracing::info!(
        mood = %analysis.record.mood,
        score = analysis.record.score,
        source = analysis.source(),
        "Reflection logged"
    );

    Ok((StatusCode::CREATED, Json(EntryResponse::new(analysis, date))))
}
