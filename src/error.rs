//! Error types for the jumpline core.
//!
//! The core uses a typed taxonomy so callers can tell validation failures
//! apart from launch failures without string matching. Cache-internal
//! failures deliberately have no variant here: the cache absorbs them and
//! degrades to a miss.

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Core errors with structured context.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// Malformed input, rejected before any external effect.
    #[error("invalid input: {0}")]
    Validation(String),

    /// Configured editor executable does not exist at launch time.
    #[error("editor executable not found: {path}")]
    EditorNotFound { path: String },

    /// No editor is configured for the requested jump.
    #[error("no editor configured: {hint}")]
    NoEditor { hint: String },

    /// Editor id not present in the registry.
    #[error("unknown editor: {id}")]
    UnknownEditor { id: String },

    /// The OS refused to start the process.
    #[error("failed to launch '{command}': {reason}")]
    Launch { command: String, reason: String },

    /// Platform has no command construction strategy.
    #[error("unsupported platform: {0}")]
    UnsupportedPlatform(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// IO error with context.
    #[error("IO error in {context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    /// Create a validation error.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create an editor-not-found error.
    pub fn editor_not_found(path: impl Into<String>) -> Self {
        Self::EditorNotFound { path: path.into() }
    }

    /// Create a launch error.
    pub fn launch(command: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Launch {
            command: command.into(),
            reason: reason.into(),
        }
    }

    /// Create an IO error with context.
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// True for errors detected before any process was started.
    pub const fn is_preflight(&self) -> bool {
        matches!(
            self,
            Self::Validation(_)
                | Self::EditorNotFound { .. }
                | Self::NoEditor { .. }
                | Self::UnknownEditor { .. }
                | Self::UnsupportedPlatform(_)
        )
    }
}
