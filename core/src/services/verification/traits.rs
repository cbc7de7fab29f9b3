//! Contract of the remote OTP service

use async_trait::async_trait;

use crate::errors::ServiceFailure;

use super::types::{SendOtpRequest, SendOtpResponse, VerifyOtpRequest, VerifyOtpResponse};

/// Trait for OTP service integration
#[async_trait]
pub trait OtpServiceTrait: Send + Sync {
    /// Ask the service to deliver a one-time passcode to a phone number
    async fn send_otp(&self, request: &SendOtpRequest) -> Result<SendOtpResponse, ServiceFailure>;
    /// Check a passcode against the request it was issued for
    ///
    /// A wrong code is a successful call with `verified == false`.
    async fn verify_otp(
        &self,
        request: &VerifyOtpRequest,
    ) -> Result<VerifyOtpResponse, ServiceFailure>;
    /// Name of the provider, for logs
    fn provider_name(&self) -> &str;
}
