//! Configuration for the verification session

use pv_shared::OtpClientConfig;

/// Configuration for a verification session
///
/// The resend threshold is deliberately absent; it is the fixed
/// [`RESEND_THRESHOLD_SECONDS`](crate::domain::RESEND_THRESHOLD_SECONDS).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionConfig {
    /// Delivery channels to request, in order of preference
    pub preferred_channels: Vec<String>,
}

impl From<&OtpClientConfig> for SessionConfig {
    fn from(config: &OtpClientConfig) -> Self {
        Self {
            preferred_channels: config.preferred_channels.clone(),
        }
    }
}
