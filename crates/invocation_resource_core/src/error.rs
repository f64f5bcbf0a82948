use std::path::PathBuf;

/// Declared configuration rejected before any invocation was attempted.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {field}: {message}")]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Failure of a create, update or delete.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LifecycleError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The invocation call itself did not complete (network, auth, throttling).
    #[error("Lambda invocation ({resource}) failed: {message}")]
    Transport {
        resource: String,
        function_name: String,
        message: String,
    },

    /// The function ran but signaled failure. `output` is its payload verbatim.
    #[error("Lambda function ({function_name}) returned error: ({output})")]
    Function {
        function_name: String,
        function_error: String,
        output: String,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("failed to access state file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed state file {path}: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
