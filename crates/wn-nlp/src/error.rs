use thiserror::Error;

/// Failures talking to a hosted classifier.
///
/// Classifier tiers log these and report "no result"; they never reach
/// the HTTP caller.
#[derive(Debug, Error)]
pub enum NlpError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("classifier returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("could not parse classifier output: {0}")]
    Decode(String),

    #[error("classifier not configured: {0}")]
    NotConfigured(&'static str),
}

pub type NlpResult<T> = Result<T, NlpError>;
