use thiserror::Error;

/// Failures talking to a routing or geocoding backend. Individual candidate
/// failures are absorbed by the callers; only total failures surface.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("http transport error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("backend returned status {status}")]
    Status { status: u16 },
    #[error("failed to decode backend response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("backend response contained no result")]
    Empty,
}

#[derive(Debug, Error)]
pub enum GeocodeError {
    #[error("no place found for the query")]
    NotFound,
    #[error("geocoding backend error: {0}")]
    Backend(#[from] BackendError),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DateRangeError {
    #[error("incomplete range: both start and end must be picked")]
    IncompleteRange,
}
