//! HTTP adapter for the remote OTP service
//!
//! Talks to `POST {base}/otp/send` and `POST {base}/otp/verify`. Every body is
//! wrapped in the `{code, message, data}` envelope; rate-limit counters arrive
//! as response headers on send.

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, info, warn};

use pv_core::{
    OtpServiceTrait, RateLimitSignals, SendOtpRequest, SendOtpResponse, ServiceFailure,
    VerifyOtpRequest, VerifyOtpResponse,
};
use pv_shared::phone::mask_phone_number;
use pv_shared::{error_codes, ApiResponse, ErrorBody, OtpClientConfig};

use crate::InfrastructureError;

/// Remaining sends for the phone number
pub const RATE_LIMIT_PHONE_HEADER: &str = "x-ratelimit-remaining-phone";
/// Remaining sends for the client origin
pub const RATE_LIMIT_IP_HEADER: &str = "x-ratelimit-remaining-ip";

const SEND_PATH: &str = "/otp/send";
const VERIFY_PATH: &str = "/otp/verify";

/// OTP service reached over HTTP
#[derive(Debug, Clone)]
pub struct HttpOtpService {
    client: Client,
    base_url: String,
}

impl HttpOtpService {
    /// Create a client for the configured endpoint
    pub fn new(config: &OtpClientConfig) -> Result<Self, InfrastructureError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        info!(
            base_url = %config.base_url,
            timeout_secs = config.request_timeout_secs,
            "HTTP OTP service initialized"
        );

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Create from environment variables
    pub fn from_env() -> Result<Self, InfrastructureError> {
        Self::new(&OtpClientConfig::from_env())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn post<B: serde::Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<(StatusCode, HeaderMap, String), ServiceFailure> {
        let response = self
            .client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .map_err(|e| ServiceFailure::Network(e.to_string()))?;

        let status = response.status();
        let headers = response.headers().clone();
        let text = response
            .text()
            .await
            .map_err(|e| ServiceFailure::Network(e.to_string()))?;

        debug!(path, status = status.as_u16(), "OTP service responded");
        Ok((status, headers, text))
    }
}

/// Parse a rate-limit header; absent or malformed values are not reported
fn header_count(headers: &HeaderMap, name: &str) -> Option<u32> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse().ok())
}

pub fn rate_limit_signals(headers: &HeaderMap) -> RateLimitSignals {
    RateLimitSignals::new(
        header_count(headers, RATE_LIMIT_PHONE_HEADER),
        header_count(headers, RATE_LIMIT_IP_HEADER),
    )
}

/// Error body of a failed call; the status code stands in when the body is unreadable
pub(crate) fn error_body(status: StatusCode, body: &str) -> ErrorBody {
    serde_json::from_str::<ErrorBody>(body)
        .unwrap_or_else(|_| ErrorBody::new(status.as_u16().to_string(), ""))
}

/// Unwrap the payload of a successful envelope
fn success_data<T: DeserializeOwned>(body: &str) -> Result<T, ServiceFailure> {
    let envelope: ApiResponse<T> = serde_json::from_str(body)
        .map_err(|e| ServiceFailure::Network(format!("invalid response body: {}", e)))?;

    if !envelope.is_success() {
        return Err(ServiceFailure::Rejected(envelope.to_error_body()));
    }
    envelope
        .into_data()
        .ok_or_else(|| ServiceFailure::Network("response body carried no data".to_string()))
}

#[async_trait]
impl OtpServiceTrait for HttpOtpService {
    async fn send_otp(&self, request: &SendOtpRequest) -> Result<SendOtpResponse, ServiceFailure> {
        let (status, headers, body) = self.post(SEND_PATH, request).await?;

        if !status.is_success() {
            let error = error_body(status, &body);
            warn!(
                phone = %mask_phone_number(&request.phone),
                status = status.as_u16(),
                code = %error.code,
                "OTP send rejected"
            );
            return Err(ServiceFailure::Rejected(error));
        }

        let mut response: SendOtpResponse = success_data(&body)?;
        response.rate_limits = rate_limit_signals(&headers);
        Ok(response)
    }

    async fn verify_otp(
        &self,
        request: &VerifyOtpRequest,
    ) -> Result<VerifyOtpResponse, ServiceFailure> {
        let (status, _headers, body) = self.post(VERIFY_PATH, request).await?;

        // A wrong code comes back as 400 + 10007 with the outcome in `data`
        if status == StatusCode::BAD_REQUEST {
            if let Ok(ApiResponse {
                code,
                data: Some(outcome),
                ..
            }) = serde_json::from_str::<ApiResponse<VerifyOtpResponse>>(&body)
            {
                if code == error_codes::OTP_VERIFICATION_FAILED {
                    return Ok(outcome);
                }
            }
        }

        if status.is_success() {
            return success_data(&body);
        }

        let error = error_body(status, &body);
        warn!(
            request_id = %request.request_id,
            status = status.as_u16(),
            code = %error.code,
            "OTP verify rejected"
        );
        Err(ServiceFailure::Rejected(error))
    }

    fn provider_name(&self) -> &str {
        "http"
    }
}
