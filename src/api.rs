use serde::{Deserialize, Serialize};

use crate::model::Highlight;

/// Body of `POST /api/v1/highlights/`: an ordered batch of records.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateHighlights {
    pub items: Vec<Highlight>,
}

/// Outcome counters for one create call. Every record in the batch lands in
/// exactly one counter; `failures` says which records failed and why.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct IngestSummary {
    pub updated: u32,
    pub inserted: u32,
    pub errors: u32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<RecordFailure>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RecordFailure {
    pub index: usize,
    pub error: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
