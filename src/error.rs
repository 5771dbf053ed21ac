//! Error types for the relay

use thiserror::Error;

/// Failures while turning a fetched page into segments.
/// Reported back to the requester as plain text.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("page has no <body> to read")]
    MissingBody,

    #[error("nothing left to send after stripping the page")]
    EmptyOutput,

    #[error("invalid selector {selector}: {reason}")]
    Selector { selector: String, reason: String },
}

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("failed to fetch {url}: {reason}")]
    Fetch { url: String, reason: String },
}
