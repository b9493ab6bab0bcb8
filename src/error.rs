use thiserror::Error;

/// Failures the request boundary distinguishes. Everything below the
/// boundary is best-effort: malformed cells degrade to null or pass
/// through as text instead of erroring.
#[derive(Debug, Error)]
pub enum Error {
    /// Transport failure or non-success status from the sheet endpoint.
    #[error("fetch failed: {0}")]
    Fetch(#[from] reqwest::Error),

    /// The response body was not a callback-wrapped payload.
    #[error("unexpected gviz envelope: {0}")]
    Envelope(String),

    /// The envelope contents were not valid JSON, or did not match the
    /// gviz table shape.
    #[error("invalid gviz payload: {0}")]
    Payload(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
