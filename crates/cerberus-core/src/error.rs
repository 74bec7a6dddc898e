use std::path::PathBuf;
use thiserror::Error;

/// Failure of the single compliance API round trip.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("compliance server at {url} is unreachable ({reason}); check server-url and network connectivity")]
    Unreachable { url: String, reason: String },

    #[error("compliance server rejected the request with HTTP {status}: {message}")]
    Rejected { status: u16, message: String },

    #[error("compliance server returned an unreadable response: {0}")]
    InvalidResponse(String),

    #[error(transparent)]
    Request(#[from] RequestError),
}

/// A request that must not be sent.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestError {
    #[error("at least one compliance framework is required")]
    EmptyFrameworks,

    #[error("invalid mode '{0}' (expected one of: validate, audit, monitor)")]
    InvalidMode(String),
}

/// A result that cannot be rendered faithfully in the requested format.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("compliance score {0} is outside the range 0-100")]
    ScoreOutOfRange(f64),

    #[error("failed to serialize {format} report: {reason}")]
    Serialization { format: String, reason: String },

    #[error("unknown report format '{0}'")]
    UnknownFormat(String),
}

/// Invalid configuration, detected before any network activity.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required option '{0}'")]
    Missing(&'static str),

    #[error("invalid value '{value}' for '{option}' (expected one of: {expected})")]
    InvalidValue {
        option: &'static str,
        value: String,
        expected: &'static str,
    },

    #[error("failed to read config file '{path}': {reason}")]
    File { path: PathBuf, reason: String },

    #[error(transparent)]
    Request(#[from] RequestError),
}

/// Fatal failure of a full check run.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Request(#[from] RequestError),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Non-fatal problem met while gathering context. The run continues with a
/// sentinel value in place of the missing data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionWarning {
    pub field: String,
    pub message: String,
}

impl CollectionWarning {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Non-fatal problem met while publishing (e.g. the PR comment could not be posted).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishWarning {
    pub target: String,
    pub message: String,
}

impl PublishWarning {
    pub fn new(target: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            message: message.into(),
        }
    }
}
