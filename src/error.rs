use thiserror::Error;

/// Failure to decode a graph snapshot from text. Individual bad records are
/// skipped during decoding and never surface here.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot is neither valid JSON nor JSON5: {json}")]
    Syntax {
        json: serde_json::Error,
        json5: json5::Error,
    },
    #[error("snapshot must be a JSON object with `nodes` and `edges`")]
    NotAnObject,
    #[error("snapshot field `{field}` must be an array")]
    InvalidList { field: &'static str },
}
