use thiserror::Error;

/// Failure reported by a `ContentGateway`. The controller never inspects the
/// detail; it only maps the failure onto its generic error state.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("request to {url} returned status {status}")]
    Status { url: String, status: u16 },
    #[error("malformed response: {0}")]
    Malformed(String),
    #[error("{kind} number {number} is out of range")]
    OutOfRange { kind: &'static str, number: u32 },
}

/// Error kinds surfaced by the reader core. None of them is fatal.
#[derive(Debug, Error)]
pub enum ReaderError {
    #[error("failed to fetch content")]
    FetchFailed(#[from] FetchError),
    #[error("failed to play verse {index}: {reason}")]
    PlaybackFailed { index: usize, reason: String },
    #[error("no bookmark exists for {section}:{verse}")]
    InvalidBookmarkOperation { section: u32, verse: u32 },
}
