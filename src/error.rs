//! Error types for askchat.
//!
//! This module defines the error type returned by the transport and the
//! configuration layer, along with [`FailureKind`], the coarse classification
//! the conversation controller records when a turn fails.

use std::error;
use std::fmt;
use std::sync::Arc;

/// The main error type for askchat.
#[derive(Clone, Debug)]
pub enum Error {
    /// The server answered with an unexpected non-2xx status.
    Api {
        /// HTTP status code.
        status_code: u16,
        /// Human-readable error message.
        message: String,
    },

    /// The `/ask` endpoint does not exist (HTTP 404).
    NotFound {
        /// Human-readable error message.
        message: String,
    },

    /// Server returned a 500 internal error.
    InternalServer {
        /// Human-readable error message.
        message: String,
        /// The `detail` field of the error body, if the server sent one.
        detail: Option<String>,
    },

    /// The request did not complete within the configured timeout.
    Timeout {
        /// Human-readable error message.
        message: String,
        /// Duration of the timeout in seconds.
        duration: Option<f64>,
    },

    /// The server could not be reached.
    Connection {
        /// Human-readable error message.
        message: String,
        /// Underlying cause.
        source: Option<Arc<dyn error::Error + Send + Sync>>,
    },

    /// Error during JSON serialization or deserialization.
    Serialization {
        /// Human-readable error message.
        message: String,
        /// The underlying error.
        source: Option<Arc<dyn error::Error + Send + Sync>>,
    },

    /// HTTP client error.
    HttpClient {
        /// Human-readable error message.
        message: String,
        /// The underlying error.
        source: Option<Arc<dyn error::Error + Send + Sync>>,
    },

    /// A user-supplied value (model name, endpoint, flag) was rejected.
    Validation {
        /// Human-readable error message.
        message: String,
        /// Parameter that failed validation.
        param: Option<String>,
    },

    /// A URL parsing or manipulation error.
    Url {
        /// Human-readable error message.
        message: String,
        /// The underlying error.
        source: Option<url::ParseError>,
    },
}

impl Error {
    /// Creates a new API error.
    pub fn api(status_code: u16, message: impl Into<String>) -> Self {
        Error::Api {
            status_code,
            message: message.into(),
        }
    }

    /// Creates a new not found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Error::NotFound {
            message: message.into(),
        }
    }

    /// Creates a new internal server error.
    pub fn internal_server(message: impl Into<String>, detail: Option<String>) -> Self {
        Error::InternalServer {
            message: message.into(),
            detail,
        }
    }

    /// Creates a new timeout error.
    pub fn timeout(message: impl Into<String>, duration: Option<f64>) -> Self {
        Error::Timeout {
            message: message.into(),
            duration,
        }
    }

    /// Creates a new connection error.
    pub fn connection(
        message: impl Into<String>,
        source: Option<Box<dyn error::Error + Send + Sync>>,
    ) -> Self {
        Error::Connection {
            message: message.into(),
            source: source.map(Arc::from),
        }
    }

    /// Creates a new serialization error.
    pub fn serialization(
        message: impl Into<String>,
        source: Option<Box<dyn error::Error + Send + Sync>>,
    ) -> Self {
        Error::Serialization {
            message: message.into(),
            source: source.map(Arc::from),
        }
    }

    /// Creates a new HTTP client error.
    pub fn http_client(
        message: impl Into<String>,
        source: Option<Box<dyn error::Error + Send + Sync>>,
    ) -> Self {
        Error::HttpClient {
            message: message.into(),
            source: source.map(Arc::from),
        }
    }

    /// Creates a new validation error.
    pub fn validation(message: impl Into<String>, param: Option<String>) -> Self {
        Error::Validation {
            message: message.into(),
            param,
        }
    }

    /// Creates a new URL error.
    pub fn url(message: impl Into<String>, source: Option<url::ParseError>) -> Self {
        Error::Url {
            message: message.into(),
            source,
        }
    }

    /// Returns true if this error is a "not found" error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }

    /// Returns true if this error is a server error.
    pub fn is_server_error(&self) -> bool {
        matches!(self, Error::InternalServer { .. })
    }

    /// Returns true if this error is a timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::Timeout { .. })
    }

    /// Returns true if this error is a connection error.
    pub fn is_connection(&self) -> bool {
        matches!(self, Error::Connection { .. })
    }

    /// Returns true if this error is a validation error.
    pub fn is_validation(&self) -> bool {
        matches!(self, Error::Validation { .. })
    }

    /// Returns the status code associated with this error, if any.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Error::Api { status_code, .. } => Some(*status_code),
            Error::NotFound { .. } => Some(404),
            Error::InternalServer { .. } => Some(500),
            _ => None,
        }
    }

    /// Classifies this error for the conversation transcript.
    pub fn kind(&self) -> FailureKind {
        match self {
            Error::NotFound { .. } => FailureKind::NotFound,
            Error::InternalServer { detail, .. } => FailureKind::ServerError {
                detail: detail.clone(),
            },
            Error::Connection { .. } => FailureKind::ConnectionRefused,
            _ => FailureKind::Generic,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Api {
                status_code,
                message,
            } => {
                write!(f, "API error ({status_code}): {message}")
            }
            Error::NotFound { message } => {
                write!(f, "Endpoint not found: {message}")
            }
            Error::InternalServer { message, detail } => {
                if let Some(detail) = detail {
                    write!(f, "Internal server error: {message} ({detail})")
                } else {
                    write!(f, "Internal server error: {message}")
                }
            }
            Error::Timeout { message, duration } => {
                if let Some(duration) = duration {
                    write!(f, "Timeout error: {message} ({duration} seconds)")
                } else {
                    write!(f, "Timeout error: {message}")
                }
            }
            Error::Connection { message, .. } => {
                write!(f, "Connection error: {message}")
            }
            Error::Serialization { message, .. } => {
                write!(f, "Serialization error: {message}")
            }
            Error::HttpClient { message, .. } => {
                write!(f, "HTTP client error: {message}")
            }
            Error::Validation { message, param } => {
                if let Some(param) = param {
                    write!(f, "Validation error: {message} (parameter: {param})")
                } else {
                    write!(f, "Validation error: {message}")
                }
            }
            Error::Url { message, .. } => {
                write!(f, "URL error: {message}")
            }
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Error::Connection { source, .. } => source
                .as_ref()
                .map(|e| e.as_ref() as &(dyn error::Error + 'static)),
            Error::Serialization { source, .. } => source
                .as_ref()
                .map(|e| e.as_ref() as &(dyn error::Error + 'static)),
            Error::HttpClient { source, .. } => source
                .as_ref()
                .map(|e| e.as_ref() as &(dyn error::Error + 'static)),
            Error::Url { source, .. } => {
                source.as_ref().map(|e| e as &(dyn error::Error + 'static))
            }
            _ => None,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::serialization(format!("JSON error: {err}"), Some(Box::new(err)))
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Error::url(format!("URL parse error: {err}"), Some(err))
    }
}

/// A specialized Result type for askchat operations.
pub type Result<T> = std::result::Result<T, Error>;

/////////////////////////////////////////// FailureKind ///////////////////////////////////////////

/// Coarse classification of a failed turn.
///
/// This is what the conversation records as its last error and what the
/// presentation layer shows as the inline notice.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FailureKind {
    /// The `/ask` endpoint answered 404.
    NotFound,
    /// The server answered 500, optionally with a detail string.
    ServerError {
        /// The server-provided detail, if any.
        detail: Option<String>,
    },
    /// The server could not be reached at all.
    ConnectionRefused,
    /// Anything else: malformed body, timeout, unexpected status.
    Generic,
}

impl FailureKind {
    /// The message placed in the synthesized bot turn.
    pub fn fallback_message(&self) -> String {
        match self {
            FailureKind::NotFound => {
                "Sorry, the chat service endpoint could not be found. Check the configured endpoint."
                    .to_string()
            }
            FailureKind::ServerError { detail: Some(detail) } => {
                format!("Sorry, the server ran into an error: {detail}")
            }
            FailureKind::ServerError { detail: None } => {
                "Sorry, the server ran into an error while generating a response.".to_string()
            }
            FailureKind::ConnectionRefused => {
                "Sorry, I could not reach the server. Is it running?".to_string()
            }
            FailureKind::Generic => {
                "Sorry, something went wrong while generating a response.".to_string()
            }
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::NotFound => write!(f, "endpoint not found (404)"),
            FailureKind::ServerError { detail: Some(detail) } => {
                write!(f, "server error (500): {detail}")
            }
            FailureKind::ServerError { detail: None } => write!(f, "server error (500)"),
            FailureKind::ConnectionRefused => write!(f, "connection refused"),
            FailureKind::Generic => write!(f, "request failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification() {
        assert_eq!(Error::not_found("missing").kind(), FailureKind::NotFound);
        assert_eq!(
            Error::internal_server("boom", Some("db down".to_string())).kind(),
            FailureKind::ServerError {
                detail: Some("db down".to_string())
            }
        );
        assert_eq!(
            Error::connection("refused", None).kind(),
            FailureKind::ConnectionRefused
        );
        assert_eq!(Error::api(503, "unavailable").kind(), FailureKind::Generic);
        assert_eq!(Error::timeout("slow", Some(1.0)).kind(), FailureKind::Generic);
        assert_eq!(
            Error::serialization("bad body", None).kind(),
            FailureKind::Generic
        );
    }

    #[test]
    fn status_codes() {
        assert_eq!(Error::not_found("x").status_code(), Some(404));
        assert_eq!(Error::internal_server("x", None).status_code(), Some(500));
        assert_eq!(Error::api(418, "teapot").status_code(), Some(418));
        assert_eq!(Error::connection("x", None).status_code(), None);
    }

    #[test]
    fn server_error_message_carries_detail() {
        let kind = FailureKind::ServerError {
            detail: Some("model overloaded".to_string()),
        };
        assert!(kind.fallback_message().contains("model overloaded"));
        assert!(kind.to_string().contains("model overloaded"));
    }

    #[test]
    fn conversions_keep_sources() {
        use std::error::Error as _;

        let err: Error = serde_json::from_str::<serde_json::Value>("{").unwrap_err().into();
        assert!(matches!(err, Error::Serialization { .. }));
        assert!(err.source().is_some());
        assert_eq!(err.kind(), FailureKind::Generic);

        let err: Error = url::Url::parse("not a url").unwrap_err().into();
        assert!(matches!(err, Error::Url { .. }));
        assert!(err.source().is_some());
    }

    #[test]
    fn display() {
        let err = Error::validation("unknown model", Some("model".to_string()));
        assert_eq!(
            err.to_string(),
            "Validation error: unknown model (parameter: model)"
        );
        let err = Error::internal_server("oops", None);
        assert_eq!(err.to_string(), "Internal server error: oops");
    }
}
