//! OTP service client configuration

use serde::{Deserialize, Serialize};
use std::env;

/// Default base URL of the OTP service
pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";

/// Default request timeout in seconds
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// OTP service client configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct OtpClientConfig {
    /// OTP service provider ("http", "mock")
    #[serde(default = "default_provider")]
    pub provider: String,

    /// Base URL of the OTP service, without trailing slash
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Timeout for a single request in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Delivery channels to try in order (e.g. "zalo", "sms"); empty means service default
    #[serde(default)]
    pub preferred_channels: Vec<String>,
}

impl Default for OtpClientConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            base_url: default_base_url(),
            request_timeout_secs: default_request_timeout_secs(),
            preferred_channels: Vec::new(),
        }
    }
}

impl OtpClientConfig {
    /// Create a configuration pointing at `base_url`
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            ..Default::default()
        }
    }

    /// Set preferred delivery channels
    pub fn with_preferred_channels<I, S>(mut self, channels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.preferred_channels = channels.into_iter().map(Into::into).collect();
        self
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self::from_vars(|key| env::var(key).ok())
    }

    /// Build configuration from a variable lookup
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            provider: lookup("OTP_PROVIDER")
                .map(|p| p.trim().to_lowercase())
                .filter(|p| !p.is_empty())
                .unwrap_or(defaults.provider),
            base_url: lookup("OTP_API_BASE_URL")
                .map(|url| url.trim().trim_end_matches('/').to_string())
                .filter(|url| !url.is_empty())
                .unwrap_or(defaults.base_url),
            request_timeout_secs: lookup("OTP_REQUEST_TIMEOUT_SECS")
                .and_then(|v| v.trim().parse().ok())
                .filter(|secs| *secs > 0)
                .unwrap_or(defaults.request_timeout_secs),
            preferred_channels: lookup("OTP_PREFERRED_CHANNELS")
                .map(|v| parse_channels(&v))
                .unwrap_or(defaults.preferred_channels),
        }
    }
}

/// Parse a comma separated channel list, lower-casing and dropping duplicates
pub fn parse_channels(value: &str) -> Vec<String> {
    let mut channels: Vec<String> = Vec::new();
    for channel in value.split(',').map(|c| c.trim().to_lowercase()) {
        if !channel.is_empty() && !channels.contains(&channel) {
            channels.push(channel);
        }
    }
    channels
}

fn default_provider() -> String {
    String::from("http")
}

fn default_base_url() -> String {
    String::from(DEFAULT_BASE_URL)
}

fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}
