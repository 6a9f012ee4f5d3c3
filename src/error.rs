use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("malformed record on line {line}: {reason}")]
    MalformedRecord { line: usize, reason: String },

    #[error("event {event} has no usable vocabulary after filtering ({documents} documents)")]
    DegenerateCorpus { event: usize, documents: usize },

    #[error("usage: {0}")]
    Usage(String),

    #[error("invalid value {value:?} for {key}")]
    Config { key: &'static str, value: String },

    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("scoring task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("forum dump: {0}")]
    Dump(#[from] serde_json::Error),
}

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io { path: path.into(), source }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
