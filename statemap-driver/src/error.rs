use thiserror::Error;

#[derive(Error, Debug)]
pub enum DriverError {
    #[error("no page scripted for {0}")]
    PageNotScripted(String),

    #[error("action on '{target}' failed: {reason}")]
    ActionFailed { target: String, reason: String },

    #[error("driver timed out after {0}ms")]
    Timeout(u64),

    #[error("navigation history is empty")]
    HistoryEmpty,

    #[error("malformed replay script: {0}")]
    MalformedScript(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, DriverError>;
