use std::fmt;

/// Errors raised while exporting a controller object
#[derive(Debug)]
pub enum ExportError {
    /// Controller rejected the credentials
    Authentication(String),

    /// Lookup by name returned no object
    ObjectNotFound { object_type: String, name: String },

    /// Transport failure or non-success status from the controller
    ControllerApi {
        url: String,
        status: Option<u16>,
        message: String,
    },

    /// Controller answered with a body that is not the expected envelope
    InvalidResponse(String),

    /// Invalid CLI input or option
    InvalidInput(String),

    /// An artifact could not be serialized
    Serialization { artifact: String, message: String },
}

impl ExportError {
    /// True for errors raised before any transformation started
    pub fn is_fetch_failure(&self) -> bool {
        matches!(
            self,
            ExportError::Authentication(_)
                | ExportError::ObjectNotFound { .. }
                | ExportError::ControllerApi { .. }
                | ExportError::InvalidResponse(_)
        )
    }
}

impl fmt::Display for ExportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportError::Authentication(msg) => {
                write!(f, "Authentication failed: {}", msg)
            }
            ExportError::ObjectNotFound { object_type, name } => {
                write!(f, "Object not found: {} named '{}'", object_type, name)
            }
            ExportError::ControllerApi {
                url,
                status,
                message,
            } => {
                write!(f, "Controller request to {} failed", url)?;

                if let Some(code) = status {
                    write!(f, " (status {})", code)?;
                }

                write!(f, ": {}", message)
            }
            ExportError::InvalidResponse(msg) => {
                write!(f, "Invalid controller response: {}", msg)
            }
            ExportError::InvalidInput(msg) => {
                write!(f, "Invalid input: {}", msg)
            }
            ExportError::Serialization { artifact, message } => {
                write!(f, "Failed to serialize {}: {}", artifact, message)
            }
        }
    }
}

impl std::error::Error for ExportError {}

/// Result type for export operations
pub type ExportResult<T> = Result<T, ExportError>;
