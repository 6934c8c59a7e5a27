use std::path::PathBuf;

use thiserror::Error;

/// Convenient alias for fallible results returned throughout the crate.
pub type Result<T> = std::result::Result<T, ToolError>;

/// Error type covering the different failure cases that can occur while a
/// data dictionary is loaded, validated, confirmed, or exchanged with the
/// remote catalog.
#[derive(Debug, Error)]
pub enum ToolError {
    /// Wrapper for IO failures such as reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Raised when JSON parsing or serialization fails.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Raised when a definitions file cannot be read as a header row plus records.
    #[error("malformed definitions file {}: {reason}", .path.display())]
    MalformedFile { path: PathBuf, reason: String },

    /// Raised when the definitions header carries attributes outside the recognized set.
    #[error(
        "definitions header contains attributes not used by the data dictionary: {}",
        .attributes.join(", ")
    )]
    UnknownColumns { attributes: Vec<String> },

    /// Raised when the definitions header does not start with the identifier attribute.
    #[error("the first attribute of the definitions header should be '{expected}', not '{found}'")]
    HeaderOrder { expected: String, found: String },

    /// Raised when definitions describe columns the remote resource does not have.
    #[error(
        "definitions reference fields that do not appear in the resource schema: {}",
        .fields.join(", ")
    )]
    UnknownFields { fields: Vec<String> },

    /// Raised when a pending type change is not approved. Nothing has been written.
    #[error(
        "changing the type of '{column}' from '{old_type}' to '{new_type}' was not approved; \
         aborting without writing"
    )]
    ConfirmationDeclined {
        column: String,
        old_type: String,
        new_type: String,
    },

    /// Raised when the remote catalog cannot be reached or answers with a failure.
    #[error("transport error: {0}")]
    Transport(String),

    /// Raised when the resource does not exist or has no datastore table.
    #[error("resource {resource_id} was not found or is not tabular")]
    NotFound { resource_id: String },

    /// Raised when a resource identifier cannot be used as a file name.
    #[error("resource identifier '{0}' cannot name a dictionary file")]
    InvalidResourceId(String),

    /// Raised when the catalog refuses a dictionary write, e.g. for a read-only resource.
    #[error("data dictionary write for resource {resource_id} was rejected: {reason}")]
    WriteRejected { resource_id: String, reason: String },

    /// Raised when credentials are missing or inconsistent.
    #[error("configuration error: {0}")]
    Config(String),

    /// Raised when a credentials file exists but is not valid YAML.
    #[error("failed to parse configuration at {}: {source}", .path.display())]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// Raised when the user provides a path that does not exist.
    #[error("input file not found: {}", .0.display())]
    MissingInput(PathBuf),

    /// Raised when the tracing subscriber fails to initialise.
    #[error("failed to initialise logging: {0}")]
    Logging(String),
}

impl ToolError {
    pub(crate) fn malformed(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        ToolError::MalformedFile {
            path: path.into(),
            reason: reason.into(),
        }
    }
}
