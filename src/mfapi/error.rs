use thiserror::Error;

/// The only failure the mfapi client produces.
#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("invalid request URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest_middleware::Error,
    },

    #[error("HTTP {status} from {url}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("failed to read response body from {url}: {source}")]
    Body {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("malformed JSON from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}

impl NetworkError {
    pub fn status(&self) -> Option<reqwest::StatusCode> {
        match self {
            NetworkError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}
