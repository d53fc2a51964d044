//! Error classification and user notification.
//!
//! Failures reach this layer in three shapes: a plain message, a native
//! Rust error, or the structured `{code, message, details}` object the
//! backend serializes. `classify` normalizes all three into one taxonomy
//! and picks the presentation severity; `report` logs the normalized triple
//! and forwards it to whatever presentation channel was injected.
//! Classification itself cannot fail.

use tracing::error;

use crate::backend::{BackendError, ErrorCode};

/// How prominently an error should be surfaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    /// Informational, nothing is broken.
    Info,
    /// Some functionality may be degraded.
    Warning,
    /// The requested operation did not work.
    Error,
    /// The application may not be able to continue.
    Critical,
}

/// Presentation capability injected into operations that surface errors.
///
/// Implementations choose the channel per severity; `Critical` messages
/// should be displayed with a longer duration than the rest.
pub trait Notifier: Send + Sync {
    fn notify(&self, severity: Severity, message: &str);
}

/// Fallback notifier that only writes to the log. Used when no UI channel
/// is wired up, so errors are never silently dropped.
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, severity: Severity, message: &str) {
        error!(?severity, "{}", message);
    }
}

/// The heterogeneous error shapes this layer accepts.
#[derive(Debug)]
pub enum RawError {
    /// A bare human-readable message.
    Message(String),
    /// A native error value.
    Native(anyhow::Error),
    /// The structured object the backend serializes across the boundary.
    Structured {
        code: ErrorCode,
        message: String,
        details: String,
    },
}

impl From<&str> for RawError {
    fn from(message: &str) -> Self {
        RawError::Message(message.to_string())
    }
}

impl From<String> for RawError {
    fn from(message: String) -> Self {
        RawError::Message(message)
    }
}

impl From<anyhow::Error> for RawError {
    fn from(error: anyhow::Error) -> Self {
        RawError::Native(error)
    }
}

impl From<BackendError> for RawError {
    fn from(error: BackendError) -> Self {
        RawError::Structured {
            code: error.error_code(),
            message: error.user_message(),
            details: error.to_string(),
        }
    }
}

/// A normalized error ready for logging and presentation.
#[derive(Debug)]
pub struct Classified {
    pub code: ErrorCode,
    pub severity: Severity,
    pub message: String,
    pub details: String,
}

/// Fixed severity table for the error taxonomy.
pub fn severity_for(code: ErrorCode) -> Severity {
    match code {
        ErrorCode::Network | ErrorCode::Download => Severity::Warning,
        ErrorCode::Permission | ErrorCode::Execution => Severity::Critical,
        ErrorCode::Io
        | ErrorCode::Zip
        | ErrorCode::Parse
        | ErrorCode::Json
        | ErrorCode::Validation
        | ErrorCode::NotFound
        | ErrorCode::Config
        | ErrorCode::Unknown => Severity::Error,
    }
}

/// Normalize any accepted error shape into the canonical taxonomy.
pub fn classify(error: &RawError) -> Classified {
    let (code, message, details) = match error {
        RawError::Message(message) => (ErrorCode::Unknown, message.clone(), String::new()),
        RawError::Native(err) => {
            // A backend error smuggled through anyhow keeps its taxonomy.
            if let Some(backend) = err.downcast_ref::<BackendError>() {
                (
                    backend.error_code(),
                    backend.user_message(),
                    backend.to_string(),
                )
            } else {
                (ErrorCode::Unknown, err.to_string(), format!("{:#}", err))
            }
        }
        RawError::Structured {
            code,
            message,
            details,
        } => (*code, message.clone(), details.clone()),
    };

    Classified {
        code,
        severity: severity_for(code),
        message,
        details,
    }
}

/// Classify `error`, log the normalized triple, and surface it through the
/// notifier if one is present. Returns the classification so callers can
/// record the message.
pub fn report(error: RawError, notifier: Option<&dyn Notifier>) -> Classified {
    let classified = classify(&error);
    error!(
        code = %classified.code,
        user_message = %classified.message,
        details = %classified.details,
        "Classified error"
    );
    if let Some(notifier) = notifier {
        notifier.notify(classified.severity, &classified.message);
    }
    classified
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingNotifier {
        seen: Mutex<Vec<(Severity, String)>>,
    }

    impl Notifier for RecordingNotifier {
        fn notify(&self, severity: Severity, message: &str) {
            self.seen
                .lock()
                .unwrap()
                .push((severity, message.to_string()));
        }
    }

    #[test]
    fn test_severity_table() {
        assert_eq!(severity_for(ErrorCode::Network), Severity::Warning);
        assert_eq!(severity_for(ErrorCode::Download), Severity::Warning);
        assert_eq!(severity_for(ErrorCode::Io), Severity::Error);
        assert_eq!(severity_for(ErrorCode::Zip), Severity::Error);
        assert_eq!(severity_for(ErrorCode::Parse), Severity::Error);
        assert_eq!(severity_for(ErrorCode::Json), Severity::Error);
        assert_eq!(severity_for(ErrorCode::Permission), Severity::Critical);
        assert_eq!(severity_for(ErrorCode::Execution), Severity::Critical);
        assert_eq!(severity_for(ErrorCode::Validation), Severity::Error);
        assert_eq!(severity_for(ErrorCode::NotFound), Severity::Error);
        assert_eq!(severity_for(ErrorCode::Config), Severity::Error);
        assert_eq!(severity_for(ErrorCode::Unknown), Severity::Error);
    }

    #[test]
    fn test_plain_message_keeps_its_text() {
        let classified = classify(&RawError::from("disk full"));
        assert_eq!(classified.code, ErrorCode::Unknown);
        assert_eq!(classified.message, "disk full");
        assert_eq!(classified.severity, Severity::Error);
    }

    #[test]
    fn test_backend_error_keeps_its_taxonomy() {
        let classified = classify(&RawError::from(BackendError::Download("403".into())));
        assert_eq!(classified.code, ErrorCode::Download);
        assert_eq!(classified.severity, Severity::Warning);
        assert!(classified.details.contains("403"));
    }

    #[test]
    fn test_backend_error_inside_anyhow_is_unwrapped() {
        let err = anyhow::Error::from(BackendError::Permission("denied".into()));
        let classified = classify(&RawError::Native(err));
        assert_eq!(classified.code, ErrorCode::Permission);
        assert_eq!(classified.severity, Severity::Critical);
    }

    #[test]
    fn test_report_notifies_at_classified_severity() {
        let notifier = RecordingNotifier::default();
        report(
            RawError::from(BackendError::Network("timeout".into())),
            Some(&notifier),
        );

        let seen = notifier.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].0, Severity::Warning);
    }

    #[test]
    fn test_report_without_notifier_still_classifies() {
        let classified = report(RawError::from("quiet"), None);
        assert_eq!(classified.message, "quiet");
    }
}
