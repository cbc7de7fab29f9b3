//! Mock OTP Service Implementation
//!
//! An in-memory OTP service for development and testing. Codes are logged
//! instead of delivered; expiry, verification attempts and the per-phone send
//! quota behave like the remote service, including its error codes.

use async_trait::async_trait;
use rand::Rng;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use tracing::{info, warn};
use uuid::Uuid;

use pv_core::{
    OtpServiceTrait, RateLimitSignals, SendOtpRequest, SendOtpResponse, ServiceFailure,
    VerifyOtpRequest, VerifyOtpResponse, DEFAULT_TTL_SECONDS,
};
use pv_shared::error_codes;
use pv_shared::phone::{is_valid_phone, mask_phone_number};

/// Verification attempts per issued code
pub const MAX_VERIFY_ATTEMPTS: u32 = 5;
/// Sends allowed per phone number within one window
pub const MAX_SENDS_PER_PHONE: u32 = 5;
/// Length of the per-phone send window
pub const SEND_WINDOW: Duration = Duration::from_secs(3600);

const KNOWN_CHANNELS: [&str; 2] = ["zalo", "sms"];

struct IssuedCode {
    phone: String,
    code: String,
    attempts: u32,
    expires_at: Instant,
}

struct SendWindow {
    started_at: Instant,
    count: u32,
}

#[derive(Default)]
struct Store {
    /// Issued codes by request id
    codes: HashMap<String, IssuedCode>,
    /// Send windows by phone number
    windows: HashMap<String, SendWindow>,
}

/// Mock OTP service for development and testing
///
/// This implementation:
/// - Logs generated codes instead of delivering them
/// - Issues uuid request ids with a 300 second validity
/// - Allows 5 verification attempts per code
/// - Enforces a per-phone send quota and reports what is left
#[derive(Clone)]
pub struct MockOtpService {
    store: Arc<Mutex<Store>>,
    /// Counter for tracking number of codes sent
    send_count: Arc<AtomicU64>,
    /// Whether to simulate transport failures
    simulate_failure: bool,
    ttl: Duration,
    max_sends_per_phone: u32,
    send_window: Duration,
}

impl MockOtpService {
    /// Create a new mock OTP service
    pub fn new() -> Self {
        Self {
            store: Arc::new(Mutex::new(Store::default())),
            send_count: Arc::new(AtomicU64::new(0)),
            simulate_failure: false,
            ttl: Duration::from_secs(u64::from(DEFAULT_TTL_SECONDS)),
            max_sends_per_phone: MAX_SENDS_PER_PHONE,
            send_window: SEND_WINDOW,
        }
    }

    /// Make every call fail as if the service were unreachable
    pub fn with_simulated_failure(mut self, simulate: bool) -> Self {
        self.simulate_failure = simulate;
        self
    }

    /// Override the validity window of issued codes
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn with_max_sends_per_phone(mut self, max_sends: u32) -> Self {
        self.max_sends_per_phone = max_sends;
        self
    }

    /// Override the length of the per-phone send window
    pub fn with_send_window(mut self, window: Duration) -> Self {
        self.send_window = window;
        self
    }

    /// Get the total number of codes sent
    pub fn get_send_count(&self) -> u64 {
        self.send_count.load(Ordering::SeqCst)
    }

    /// Code issued for `request_id`, while it is still outstanding
    pub fn issued_code(&self, request_id: &str) -> Option<String> {
        self.lock()
            .codes
            .get(request_id)
            .map(|issued| issued.code.clone())
    }

    /// Number of issued codes and phone send windows currently held
    pub fn tracked_entries(&self) -> (usize, usize) {
        let store = self.lock();
        (store.codes.len(), store.windows.len())
    }

    fn lock(&self) -> MutexGuard<'_, Store> {
        self.store.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn generate_code() -> String {
        format!("{:06}", rand::thread_rng().gen_range(0..1_000_000))
    }

    /// First known channel from the preference list; zalo, then sms, by default
    fn pick_channel(preferred: &[String]) -> String {
        preferred
            .iter()
            .map(|c| c.to_lowercase())
            .find(|c| KNOWN_CHANNELS.contains(&c.as_str()))
            .unwrap_or_else(|| KNOWN_CHANNELS[0].to_string())
    }

    /// Drop expired codes and send windows that have run out
    fn evict_stale(&self, store: &mut Store, now: Instant) {
        store.codes.retain(|_, issued| issued.expires_at > now);
        store
            .windows
            .retain(|_, window| now.duration_since(window.started_at) < self.send_window);
    }

    /// Count a send against the phone's window; returns sends left
    fn take_send_quota(&self, store: &mut Store, phone: &str, now: Instant) -> Option<u32> {
        let window = store
            .windows
            .entry(phone.to_string())
            .or_insert(SendWindow {
                started_at: now,
                count: 0,
            });
        if now.duration_since(window.started_at) >= self.send_window {
            window.started_at = now;
            window.count = 0;
        }
        if window.count >= self.max_sends_per_phone {
            return None;
        }
        window.count += 1;
        Some(self.max_sends_per_phone - window.count)
    }
}

impl Default for MockOtpService {
    fn default() -> Self {
        Self::new()
    }
}

fn not_found() -> ServiceFailure {
    ServiceFailure::rejected(error_codes::OTP_EXPIRED, "OTP not found or expired")
}

#[async_trait]
impl OtpServiceTrait for MockOtpService {
    async fn send_otp(&self, request: &SendOtpRequest) -> Result<SendOtpResponse, ServiceFailure> {
        let masked_phone = mask_phone_number(&request.phone);

        if self.simulate_failure {
            warn!(
                target: "otp_service",
                provider = "mock",
                phone = %masked_phone,
                "Mock OTP service simulating failure"
            );
            return Err(ServiceFailure::Network("Simulated OTP service failure".to_string()));
        }

        if !is_valid_phone(&request.phone) {
            return Err(ServiceFailure::rejected(
                error_codes::INVALID_PHONE,
                "Invalid phone number",
            ));
        }

        let code = Self::generate_code();
        let request_id = Uuid::new_v4().to_string();
        let channel = Self::pick_channel(&request.preferred_channels);

        let remaining_phone = {
            let mut store = self.lock();
            let now = Instant::now();
            self.evict_stale(&mut store, now);
            let Some(remaining) = self.take_send_quota(&mut store, &request.phone, now) else {
                warn!(
                    target: "otp_service",
                    provider = "mock",
                    phone = %masked_phone,
                    "Send quota exhausted for phone"
                );
                return Err(ServiceFailure::rejected(
                    error_codes::OTP_RATE_LIMITED,
                    "Too many OTP requests for this phone number",
                ));
            };
            store.codes.insert(
                request_id.clone(),
                IssuedCode {
                    phone: request.phone.clone(),
                    code: code.clone(),
                    attempts: 0,
                    expires_at: now + self.ttl,
                },
            );
            remaining
        };

        let count = self.send_count.fetch_add(1, Ordering::SeqCst) + 1;

        // The code is the delivery in development
        info!(
            target: "otp_service",
            provider = "mock",
            phone = %masked_phone,
            channel = %channel,
            request_id = %request_id,
            code = %code,
            count,
            "Mock OTP issued"
        );

        Ok(SendOtpResponse {
            channel,
            request_id,
            ttl_seconds: u32::try_from(self.ttl.as_secs()).unwrap_or(u32::MAX),
            masked_phone,
            rate_limits: RateLimitSignals::new(Some(remaining_phone), None),
        })
    }

    async fn verify_otp(
        &self,
        request: &VerifyOtpRequest,
    ) -> Result<VerifyOtpResponse, ServiceFailure> {
        if self.simulate_failure {
            return Err(ServiceFailure::Network("Simulated OTP service failure".to_string()));
        }

        let mut store = self.lock();
        let Some(issued) = store.codes.get_mut(&request.request_id) else {
            return Err(not_found());
        };
        if issued.phone != request.phone {
            return Err(not_found());
        }
        if issued.expires_at <= Instant::now() {
            store.codes.remove(&request.request_id);
            return Err(not_found());
        }
        if issued.attempts >= MAX_VERIFY_ATTEMPTS {
            store.codes.remove(&request.request_id);
            return Err(ServiceFailure::rejected(
                error_codes::OTP_ATTEMPTS_EXCEEDED,
                "Maximum verification attempts exceeded",
            ));
        }

        if issued.code == request.code {
            store.codes.remove(&request.request_id);
            info!(
                target: "otp_service",
                provider = "mock",
                request_id = %request.request_id,
                "Mock OTP verified"
            );
            return Ok(VerifyOtpResponse {
                verified: true,
                message: "OTP verified successfully".to_string(),
                remaining_attempts: None,
            });
        }

        issued.attempts += 1;
        let remaining = MAX_VERIFY_ATTEMPTS - issued.attempts;
        warn!(
            target: "otp_service",
            provider = "mock",
            request_id = %request.request_id,
            remaining_attempts = remaining,
            "Mock OTP verification failed"
        );
        Ok(VerifyOtpResponse {
            verified: false,
            message: "Invalid OTP code".to_string(),
            remaining_attempts: Some(remaining),
        })
    }

    fn provider_name(&self) -> &str {
        "mock"
    }
}
