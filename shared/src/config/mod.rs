//! Configuration module
//!
//! - `client` - OTP service endpoint, timeout, and delivery channel preferences
//! - `environment` - Deployment environment detection
//! - `logging` - Log level and format

pub mod client;
pub mod environment;
pub mod logging;

use serde::{Deserialize, Serialize};

// Re-export commonly used types
pub use client::OtpClientConfig;
pub use environment::Environment;
pub use logging::{LogFormat, LoggingConfig};

/// Complete client configuration combining all sub-configurations
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub environment: Environment,

    /// OTP service client configuration
    #[serde(default)]
    pub client: OtpClientConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from environment
    pub fn from_env() -> Self {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let environment = Environment::from_vars(&lookup);
        Self {
            environment,
            client: OtpClientConfig::from_vars(&lookup),
            logging: LoggingConfig::from_vars(environment, &lookup),
        }
    }
}
