// src/crawler/error.rs
// =============================================================================
// Everything that can stop a single fetch before an asset exists.
//
// Each variant keeps the address that failed so the log line alone is enough
// to find the offending input.
// =============================================================================

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid URL '{address}': {source}")]
    InvalidUrl {
        address: String,
        #[source]
        source: url::ParseError,
    },

    #[error("request to '{address}' failed: {source}")]
    Request {
        address: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("reading body of '{address}' failed: {source}")]
    Body {
        address: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("encoding asset for '{address}' failed: {source}")]
    Encode {
        address: String,
        #[source]
        source: serde_json::Error,
    },
}

impl FetchError {
    /// Short name of the pipeline stage that failed, used as a log field.
    pub fn stage(&self) -> &'static str {
        match self {
            FetchError::InvalidUrl { .. } => "url",
            FetchError::Request { .. } => "request",
            FetchError::Body { .. } => "body",
            FetchError::Encode { .. } => "encode",
        }
    }

    pub fn address(&self) -> &str {
        match self {
            FetchError::InvalidUrl { address, .. }
            | FetchError::Request { address, .. }
            | FetchError::Body { address, .. }
            | FetchError::Encode { address, .. } => address,
        }
    }
}
