// ABOUTME: Error types for sandbox operations
// ABOUTME: Configuration, not-found, engine transport and archive failures

use thiserror::Error;

/// Main error type for sandbox operations
#[derive(Error, Debug)]
pub enum SandboxError {
    /// Invalid or missing configuration
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The adapter could not reach its engine when it was constructed
    #[error("Sandbox engine not initialized: {0}")]
    NotInitialized(String),

    /// Image missing locally; never pulled implicitly
    #[error("Image '{image}' not found. Build or pull it first (e.g. `docker pull {image}`)")]
    ImageNotFound { image: String },

    /// Provider named but not implemented
    #[error("Sandbox provider '{provider}' is not implemented, use '{alternative}' instead")]
    NotImplemented {
        provider: String,
        alternative: String,
    },

    #[error("Sandbox not found: {0}")]
    SandboxNotFound(String),

    #[error("File not found: {0}")]
    FileNotFound(String),

    /// Engine transport or API failure
    #[error("Engine error: {0}")]
    Engine(#[from] bollard::errors::Error),

    /// Tar packing/unpacking failure
    #[error("Archive error: {0}")]
    Archive(#[from] std::io::Error),

    /// A helper command inside the sandbox exited non-zero
    #[error("Command failed: {0}")]
    CommandFailed(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl SandboxError {
    /// Fatal setup problems that retrying will not fix
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::Configuration(_)
                | Self::NotInitialized(_)
                | Self::ImageNotFound { .. }
                | Self::NotImplemented { .. }
        )
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::SandboxNotFound(_) | Self::FileNotFound(_))
    }
}

/// Result type alias for sandbox operations
pub type Result<T> = std::result::Result<T, SandboxError>;
