//! Error types surfaced by the verification session.
//!
//! [`ServiceFailure`] is what an OTP service adapter reports; the session turns
//! it into a [`VerificationError`] through [`translate_service_failure`], the
//! only place that knows the reserved sentinel codes.

use pv_shared::error_codes;
use thiserror::Error;

pub use pv_shared::errors::ErrorBody as ServiceError;

pub const INVALID_PHONE_MESSAGE: &str =
    "Please enter a valid Vietnam phone number (e.g., 0912345678)";
pub const INVALID_CODE_MESSAGE: &str = "Please enter a 6-digit OTP code";
pub const CODE_NOT_REQUESTED_MESSAGE: &str = "Please request an OTP before verifying";
pub const NETWORK_ERROR_MESSAGE: &str = "Network error. Please try again.";
pub const EXPIRED_MESSAGE: &str = "OTP expired. Please request a new one.";
pub const ATTEMPTS_EXCEEDED_MESSAGE: &str = "Too many failed attempts. Please request a new OTP.";
pub const SEND_FAILED_MESSAGE: &str = "Failed to send OTP";
pub const VERIFY_FAILED_MESSAGE: &str = "Failed to verify OTP";

/// Failure reported by an OTP service adapter
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ServiceFailure {
    /// The request never produced a service answer (connect, timeout, decode)
    #[error("Network failure: {0}")]
    Network(String),

    /// The service answered with an error body
    #[error("Service rejected request: {} ({})", .0.message, .0.code)]
    Rejected(ServiceError),
}

impl ServiceFailure {
    /// Shorthand for a rejection with the given code and message
    pub fn rejected(code: impl Into<String>, message: impl Into<String>) -> Self {
        ServiceFailure::Rejected(ServiceError::new(code, message))
    }
}

/// Discriminant of a [`VerificationError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    InvalidPhone,
    InvalidCode,
    NetworkFailure,
    ServiceRejected,
    Expired,
    AttemptsExceeded,
}

/// Error recorded in the session and returned to the caller
///
/// Every variant carries the human-readable message shown to the user.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VerificationError {
    #[error("{message}")]
    InvalidPhone { message: String },

    #[error("{message}")]
    InvalidCode { message: String },

    #[error("{message}")]
    NetworkFailure { message: String },

    #[error("{message}")]
    ServiceRejected { code: String, message: String },

    #[error("{message}")]
    Expired { message: String },

    #[error("{message}")]
    AttemptsExceeded { message: String },
}

impl VerificationError {
    pub fn invalid_phone() -> Self {
        VerificationError::InvalidPhone {
            message: INVALID_PHONE_MESSAGE.to_string(),
        }
    }

    pub fn invalid_code() -> Self {
        VerificationError::InvalidCode {
            message: INVALID_CODE_MESSAGE.to_string(),
        }
    }

    /// Verify attempted before a code was requested
    pub fn code_not_requested() -> Self {
        VerificationError::InvalidCode {
            message: CODE_NOT_REQUESTED_MESSAGE.to_string(),
        }
    }

    pub fn network() -> Self {
        VerificationError::NetworkFailure {
            message: NETWORK_ERROR_MESSAGE.to_string(),
        }
    }

    pub fn expired() -> Self {
        VerificationError::Expired {
            message: EXPIRED_MESSAGE.to_string(),
        }
    }

    pub fn attempts_exceeded() -> Self {
        VerificationError::AttemptsExceeded {
            message: ATTEMPTS_EXCEEDED_MESSAGE.to_string(),
        }
    }

    pub fn service_rejected(code: impl Into<String>, message: impl Into<String>) -> Self {
        VerificationError::ServiceRejected {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            VerificationError::InvalidPhone { .. } => ErrorKind::InvalidPhone,
            VerificationError::InvalidCode { .. } => ErrorKind::InvalidCode,
            VerificationError::NetworkFailure { .. } => ErrorKind::NetworkFailure,
            VerificationError::ServiceRejected { .. } => ErrorKind::ServiceRejected,
            VerificationError::Expired { .. } => ErrorKind::Expired,
            VerificationError::AttemptsExceeded { .. } => ErrorKind::AttemptsExceeded,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            VerificationError::InvalidPhone { message }
            | VerificationError::InvalidCode { message }
            | VerificationError::NetworkFailure { message }
            | VerificationError::ServiceRejected { message, .. }
            | VerificationError::Expired { message }
            | VerificationError::AttemptsExceeded { message } => message,
        }
    }

    /// Raw service code, for rejections passed through uninterpreted
    pub fn service_code(&self) -> Option<&str> {
        match self {
            VerificationError::ServiceRejected { code, .. } => Some(code),
            _ => None,
        }
    }

    /// Whether the request id is burnt and a fresh send is required
    pub fn forces_restart(&self) -> bool {
        matches!(
            self,
            VerificationError::Expired { .. } | VerificationError::AttemptsExceeded { .. }
        )
    }

    /// Whether the error was raised locally, without contacting the service
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            VerificationError::InvalidPhone { .. } | VerificationError::InvalidCode { .. }
        )
    }
}

/// Map a service failure onto the error kind shown to the user
///
/// `fallback_message` replaces an empty service message for pass-through
/// rejections.
pub fn translate_service_failure(
    failure: ServiceFailure,
    fallback_message: &str,
) -> VerificationError {
    match failure {
        ServiceFailure::Network(_) => VerificationError::network(),
        ServiceFailure::Rejected(error) => match error.code.as_str() {
            error_codes::OTP_EXPIRED => VerificationError::expired(),
            error_codes::OTP_ATTEMPTS_EXCEEDED => VerificationError::attempts_exceeded(),
            _ => {
                let message = if error.message.trim().is_empty() {
                    fallback_message.to_string()
                } else {
                    error.message
                };
                VerificationError::service_rejected(error.code, message)
            }
        },
    }
}

pub type SessionResult<T> = Result<T, VerificationError>;
