//! Response envelope of the OTP service

use serde::{Deserialize, Serialize};

use crate::errors::{error_codes, ErrorBody};

/// Envelope wrapping every OTP service response body
///
/// `{"code": "0", "message": "OTP sent successfully", "data": {...}}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    /// Service result code, `"0"` on success
    pub code: String,

    /// Human-readable message
    #[serde(default)]
    pub message: String,

    /// Response payload
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    /// Create a successful response
    pub fn success(message: impl Into<String>, data: T) -> Self {
        Self {
            code: error_codes::SUCCESS.to_string(),
            message: message.into(),
            data: Some(data),
        }
    }

    /// Create a response carrying a payload under a non-success code
    pub fn with_code(code: impl Into<String>, message: impl Into<String>, data: T) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            data: Some(data),
        }
    }

    /// Create an error response without payload
    pub fn error(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            data: None,
        }
    }

    /// Check if the response is successful
    pub fn is_success(&self) -> bool {
        self.code == error_codes::SUCCESS
    }

    /// Extract the data, consuming the response
    pub fn into_data(self) -> Option<T> {
        self.data
    }

    /// Error body view of this envelope
    pub fn to_error_body(&self) -> ErrorBody {
        ErrorBody::new(self.code.clone(), self.message.clone())
    }
}
