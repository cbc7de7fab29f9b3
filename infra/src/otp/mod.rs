//! OTP Service Module
//!
//! Implementations of the OTP service contract the verification session
//! drives.
//!
//! ## Providers
//!
//! - **http**: the remote OTP service over HTTP
//! - **mock**: in-memory service that logs codes, for development

use std::sync::Arc;

use pv_core::OtpServiceTrait;
use pv_shared::OtpClientConfig;

use crate::InfrastructureError;

pub mod http_client;
pub mod mock_otp;

pub use http_client::HttpOtpService;
pub use mock_otp::MockOtpService;

#[cfg(test)]
mod tests;

/// Create an OTP service based on configuration
///
/// Unknown providers fall back to the mock service with a warning.
pub fn create_otp_service(
    config: &OtpClientConfig,
) -> Result<Arc<dyn OtpServiceTrait>, InfrastructureError> {
    match config.provider.as_str() {
        "http" => Ok(Arc::new(HttpOtpService::new(config)?)),
        "mock" => Ok(Arc::new(MockOtpService::new())),
        other => {
            tracing::warn!(provider = other, "Unknown OTP provider, falling back to mock OTP service");
            Ok(Arc::new(MockOtpService::new()))
        }
    }
}
