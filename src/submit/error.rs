use thiserror::Error;

/// Failures that end a single submission run
///
/// Every variant is caught by the pipeline and turned into one
/// user-visible message; none of them escape a run.
#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("tag error: {0:#}")]
    Tag(anyhow::Error),

    #[error("extractor unavailable: {0}")]
    ExtractorUnavailable(String),

    #[error("malformed extractor output: {0}")]
    MalformedOutput(String),

    #[error("transport error: {0}")]
    Transport(#[from] Box<ureq::Transport>),
}

impl From<serde_json::Error> for SubmitError {
    fn from(err: serde_json::Error) -> Self {
        SubmitError::MalformedOutput(err.to_string())
    }
}

pub type SubmitResult<T> = Result<T, SubmitError>;
