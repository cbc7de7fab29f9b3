//! Configuration loading for the infrastructure layer
//!
//! Values come from process environment variables, optionally seeded from the
//! environment-specific `.env` file and then `.env`. Variables already set in
//! the process are never overwritten.

use anyhow::Context;
use pv_shared::{AppConfig, Environment, OtpClientConfig};

use crate::InfrastructureError;

/// Load `.env` files and build the application configuration
pub fn load_config() -> Result<AppConfig, InfrastructureError> {
    let environment = Environment::from_env();
    load_env_file(&environment.env_file())?;
    load_env_file(".env")?;

    let config = AppConfig::from_env();
    validate_client_config(&config.client)?;

    tracing::debug!(
        environment = %config.environment,
        provider = %config.client.provider,
        base_url = %config.client.base_url,
        "Configuration loaded"
    );
    Ok(config)
}

/// Load a dotenv file if present; a missing file is not an error
fn load_env_file(path: &str) -> Result<(), InfrastructureError> {
    match dotenvy::from_filename(path) {
        Ok(_) => Ok(()),
        Err(e) if e.not_found() => Ok(()),
        Err(e) => Err(InfrastructureError::General(
            anyhow::Error::new(e).context(format!("failed to load {}", path)),
        )),
    }
}

/// Reject client settings the adapters cannot work with
pub fn validate_client_config(config: &OtpClientConfig) -> Result<(), InfrastructureError> {
    if config.provider.trim().is_empty() {
        return Err(InfrastructureError::Config(
            "OTP_PROVIDER must not be empty".to_string(),
        ));
    }

    if config.provider == "http" {
        let url = reqwest::Url::parse(&config.base_url)
            .with_context(|| format!("invalid OTP_API_BASE_URL: {}", config.base_url))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(InfrastructureError::Config(format!(
                "OTP_API_BASE_URL must use http or https, got {}",
                url.scheme()
            )));
        }
    }

    Ok(())
}
