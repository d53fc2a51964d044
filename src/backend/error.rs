use thiserror::Error;

/// Stable numeric codes shared with the backend, so structured errors can
/// cross the boundary without losing their kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum ErrorCode {
    Network = 1000,
    Parse = 2000,
    Io = 3000,
    Download = 4000,
    Config = 5000,
    Json = 6000,
    Zip = 7000,
    Validation = 8000,
    NotFound = 9000,
    Permission = 10000,
    Execution = 11000,
    Unknown = 99999,
}

impl ErrorCode {
    pub fn as_u32(self) -> u32 {
        self as u32
    }

    /// Map a backend-supplied numeric code back to a kind. Anything
    /// unrecognized becomes `Unknown` rather than an error.
    pub fn from_u32(code: u32) -> Self {
        match code {
            1000 => ErrorCode::Network,
            2000 => ErrorCode::Parse,
            3000 => ErrorCode::Io,
            4000 => ErrorCode::Download,
            5000 => ErrorCode::Config,
            6000 => ErrorCode::Json,
            7000 => ErrorCode::Zip,
            8000 => ErrorCode::Validation,
            9000 => ErrorCode::NotFound,
            10000 => ErrorCode::Permission,
            11000 => ErrorCode::Execution,
            _ => ErrorCode::Unknown,
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}({})", self, self.as_u32())
    }
}

/// Errors crossing the backend boundary.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("Network request failed: {0}")]
    Network(String),

    #[error("Failed to parse page content: {0}")]
    Parse(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Download failed: {0}")]
    Download(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Archive error: {0}")]
    Zip(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Permission denied: {0}")]
    Permission(String),

    #[error("Failed to launch: {0}")]
    Execution(String),

    #[error("Unknown error: {0}")]
    Unknown(String),
}

pub type BackendResult<T> = Result<T, BackendError>;

impl BackendError {
    pub fn error_code(&self) -> ErrorCode {
        match self {
            BackendError::Network(_) => ErrorCode::Network,
            BackendError::Parse(_) => ErrorCode::Parse,
            BackendError::Io(_) => ErrorCode::Io,
            BackendError::Download(_) => ErrorCode::Download,
            BackendError::Config(_) => ErrorCode::Config,
            BackendError::Json(_) => ErrorCode::Json,
            BackendError::Zip(_) => ErrorCode::Zip,
            BackendError::Validation(_) => ErrorCode::Validation,
            BackendError::NotFound(_) => ErrorCode::NotFound,
            BackendError::Permission(_) => ErrorCode::Permission,
            BackendError::Execution(_) => ErrorCode::Execution,
            BackendError::Unknown(_) => ErrorCode::Unknown,
        }
    }

    /// User-facing message for this error kind, without internal detail.
    pub fn user_message(&self) -> String {
        match self {
            BackendError::Network(_) => {
                "Network connection failed, check your connection and try again".to_string()
            }
            BackendError::Parse(_) => {
                "Failed to read catalog data, the site layout may have changed".to_string()
            }
            BackendError::Io(_) => {
                "File read/write error, check disk space and permissions".to_string()
            }
            BackendError::Download(_) => "Download failed, please try again later".to_string(),
            BackendError::Config(_) => "Configuration error, settings may be corrupted".to_string(),
            BackendError::Json(_) => "Malformed data received, please try again".to_string(),
            BackendError::Zip(_) => {
                "Failed to unpack archive, the file may be corrupted".to_string()
            }
            BackendError::Validation(msg) => format!("Validation failed: {}", msg),
            BackendError::NotFound(msg) => format!("Resource not found: {}", msg),
            BackendError::Permission(_) => {
                "Insufficient permissions, try running as administrator".to_string()
            }
            BackendError::Execution(_) => {
                "Failed to launch, make sure the system meets the requirements".to_string()
            }
            BackendError::Unknown(_) => {
                "An unknown error occurred, try restarting the application".to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_roundtrip() {
        for code in [
            ErrorCode::Network,
            ErrorCode::Parse,
            ErrorCode::Io,
            ErrorCode::Download,
            ErrorCode::Config,
            ErrorCode::Json,
            ErrorCode::Zip,
            ErrorCode::Validation,
            ErrorCode::NotFound,
            ErrorCode::Permission,
            ErrorCode::Execution,
            ErrorCode::Unknown,
        ] {
            assert_eq!(ErrorCode::from_u32(code.as_u32()), code);
        }
        assert_eq!(ErrorCode::from_u32(12345), ErrorCode::Unknown);
    }

    #[test]
    fn test_backend_error_maps_to_its_code() {
        assert_eq!(
            BackendError::Network("timeout".into()).error_code(),
            ErrorCode::Network
        );
        assert_eq!(
            BackendError::Execution("exit 1".into()).error_code(),
            ErrorCode::Execution
        );
    }
}
