use thiserror::Error;

/// Why a single record in a batch was rejected before reaching the store.
/// These end up in the `errors` counter, never abort the batch.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum HighlightError {
    #[error("text is required")]
    MissingText,
    #[error("source_id is required")]
    MissingSourceId,
}
