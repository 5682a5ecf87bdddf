use std::sync::Arc;

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use tracing::info;

use crate::api::{CreateHighlights, ErrorResponse, IngestSummary, RecordFailure};
use crate::db::{Database, UpsertOutcome};

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Database>,
}

fn success<T: Serialize>(data: T) -> Response {
    (StatusCode::OK, Json(data)).into_response()
}

fn bad_request(msg: &str) -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse {
            error: msg.to_string(),
        }),
    )
        .into_response()
}

fn internal_error(msg: &str) -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            error: msg.to_string(),
        }),
    )
        .into_response()
}

pub async fn healthcheck() -> impl IntoResponse {
    info!("got healthcheck request");
    Json(serde_json::json!({ "status": "ok" }))
}

/// Batch ingest. Each record is upserted on its (text, source_id) pair, in
/// order; a record that fails is counted and the rest of the batch goes on.
pub async fn create_highlights(
    State(state): State<AppState>,
    payload: Result<Json<CreateHighlights>, JsonRejection>,
) -> Response {
    let Json(payload) = match payload {
        Ok(payload) => payload,
        Err(rejection) => {
            tracing::warn!("rejected create request: {}", rejection.body_text());
            return bad_request("body must be {\"items\": [..]}");
        }
    };

    let mut summary = IngestSummary::default();

    for (index, highlight) in payload.items.iter().enumerate() {
        if let Err(e) = highlight.validate() {
            tracing::warn!("skipping record {}: {}", index, e);
            summary.errors += 1;
            summary.failures.push(RecordFailure {
                index,
                error: e.to_string(),
            });
            continue;
        }

        match state.db.upsert_highlight(highlight).await {
            Ok(UpsertOutcome::Inserted) => summary.inserted += 1,
            Ok(UpsertOutcome::Updated) => summary.updated += 1,
            Err(e) => {
                tracing::warn!("can't persist record {}: {}", index, e);
                summary.errors += 1;
                summary.failures.push(RecordFailure {
                    index,
                    error: e.to_string(),
                });
            }
        }
    }

    tracing::info!(
        inserted = summary.inserted,
        updated = summary.updated,
        errors = summary.errors,
        "processed highlight batch"
    );

    success(summary)
}

/// Returns every stored highlight as a plain JSON array.
pub async fn list_highlights(State(state): State<AppState>) -> Response {
    match state.db.list_highlights().await {
        Ok(highlights) => success(highlights),
        Err(e) => {
            tracing::error!("failed to list highlights: {}", e);
            internal_error("failed to list highlights")
        }
    }
}
