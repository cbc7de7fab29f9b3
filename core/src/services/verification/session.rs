//! Verification session state machine

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use pv_shared::error_codes;
use pv_shared::phone::{is_valid_phone, mask_phone_number, normalize_phone_input};
use pv_shared::validation::{is_valid_code, normalize_code_input};

use crate::domain::{SessionState, Step};
use crate::errors::{
    translate_service_failure, SessionResult, VerificationError, SEND_FAILED_MESSAGE,
    VERIFY_FAILED_MESSAGE,
};

use super::config::SessionConfig;
use super::traits::OtpServiceTrait;
use super::types::{
    IgnoreReason, SendOtpRequest, SendOtpResponse, SendOutcome, SessionView, VerifyOtpRequest,
    VerifyOtpResponse, VerifyOutcome,
};

pub const VERIFIED_MESSAGE: &str = "Phone number verified successfully!";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operation {
    Send,
    Verify,
}

/// Outstanding service call
#[derive(Debug, Clone, Copy)]
struct Pending {
    operation: Operation,
    epoch: u64,
}

/// Context a service call was issued in
#[derive(Debug, Clone)]
struct Fence {
    epoch: u64,
    /// Request id the call is bound to; verify only
    request_id: Option<String>,
}

/// Where a send takes its phone number from
enum PhoneSource<'a> {
    Given(&'a str),
    Stored,
}

#[derive(Debug, Default)]
struct Inner {
    state: SessionState,
    pending: Option<Pending>,
    /// Bumped on reset; responses issued under an older epoch are dropped
    epoch: u64,
}

impl Inner {
    fn begin(&mut self, operation: Operation, request_id: Option<String>) -> Fence {
        self.pending = Some(Pending {
            operation,
            epoch: self.epoch,
        });
        Fence {
            epoch: self.epoch,
            request_id,
        }
    }

    /// Close the pending call if the session still matches its context
    fn finish(&mut self, fence: &Fence) -> bool {
        if self.epoch != fence.epoch {
            return false;
        }
        if let Some(request_id) = &fence.request_id {
            if &self.state.request_id != request_id {
                return false;
            }
        }
        self.pending = None;
        true
    }
}

fn lock_inner(inner: &Mutex<Inner>) -> MutexGuard<'_, Inner> {
    inner.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Releases the pending slot when a call's future is dropped mid-flight
struct PendingGuard<'a> {
    inner: &'a Mutex<Inner>,
    epoch: u64,
    armed: bool,
}

impl<'a> PendingGuard<'a> {
    fn new(inner: &'a Mutex<Inner>, fence: &Fence) -> Self {
        Self {
            inner,
            epoch: fence.epoch,
            armed: true,
        }
    }

    /// The call ran to completion; hand back the lock to apply its result
    fn complete(mut self) -> MutexGuard<'a, Inner> {
        self.armed = false;
        lock_inner(self.inner)
    }
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut inner = lock_inner(self.inner);
        // A reset followed by a new call owns the slot now
        if let Some(pending) = inner.pending {
            if pending.epoch == self.epoch && inner.epoch == self.epoch {
                inner.pending = None;
                tracing::debug!(
                    operation = ?pending.operation,
                    event = "pending_request_abandoned",
                    "Outstanding request dropped before completion"
                );
            }
        }
    }
}

/// Client-side state machine of one phone verification attempt
///
/// All methods take `&self`; state lives behind a mutex that is never held
/// across a service call, so [`tick`](Self::tick) keeps running while a send
/// or verify is outstanding. At most one send or verify is in flight; a
/// second one is ignored with [`IgnoreReason::Busy`]. Dropping a send or
/// verify future before it resolves frees the slot again.
pub struct VerificationSession<S: OtpServiceTrait + ?Sized> {
    /// OTP service the session talks to
    service: Arc<S>,
    /// Session configuration
    config: SessionConfig,
    inner: Mutex<Inner>,
}

impl<S: OtpServiceTrait + ?Sized> VerificationSession<S> {
    /// Create a session in the initial state
    pub fn new(service: Arc<S>) -> Self {
        Self::with_config(service, SessionConfig::default())
    }

    pub fn with_config(service: Arc<S>, config: SessionConfig) -> Self {
        Self {
            service,
            config,
            inner: Mutex::new(Inner::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        lock_inner(&self.inner)
    }

    /// Snapshot of the current state
    pub fn state(&self) -> SessionState {
        self.lock().state.clone()
    }

    /// Snapshot plus derived display flags
    pub fn view(&self) -> SessionView {
        let inner = self.lock();
        SessionView::new(inner.state.clone(), inner.pending.is_some())
    }

    pub fn step(&self) -> Step {
        self.lock().state.step
    }

    pub fn is_busy(&self) -> bool {
        self.lock().pending.is_some()
    }

    /// Whether [`resend_otp`](Self::resend_otp) would be issued now
    pub fn resend_allowed(&self) -> bool {
        let inner = self.lock();
        inner.pending.is_none() && inner.state.resend_allowed()
    }

    /// Store phone input as typed; returns the stored value
    ///
    /// Only accepted on the phone step while nothing is outstanding.
    pub fn set_phone_input(&self, raw: &str) -> String {
        let mut inner = self.lock();
        if inner.pending.is_none() && inner.state.step == Step::AwaitingPhone {
            inner.state.phone = normalize_phone_input(raw);
        }
        inner.state.phone.clone()
    }

    /// Store code input as typed; returns the stored value
    pub fn set_code_input(&self, raw: &str) -> String {
        let mut inner = self.lock();
        if inner.pending.is_none() {
            inner.state.code = normalize_code_input(raw);
        }
        inner.state.code.clone()
    }

    /// Request a passcode for `phone`
    ///
    /// Valid from either step. On success the session moves to
    /// [`Step::AwaitingCode`] with the new request id and countdown; on
    /// failure only `last_error` changes.
    pub async fn send(&self, phone: &str) -> SessionResult<SendOutcome> {
        self.run_send(PhoneSource::Given(phone)).await
    }

    /// Send a fresh code to the stored phone number
    ///
    /// Ignored with [`IgnoreReason::CooldownActive`] while the countdown is
    /// above the resend threshold.
    pub async fn resend_otp(&self) -> SessionResult<SendOutcome> {
        self.run_send(PhoneSource::Stored).await
    }

    async fn run_send(&self, source: PhoneSource<'_>) -> SessionResult<SendOutcome> {
        let (fence, phone) = {
            let mut inner = self.lock();
            if inner.pending.is_some() {
                tracing::debug!(event = "send_ignored_busy", "Send ignored while a request is outstanding");
                return Ok(SendOutcome::Ignored(IgnoreReason::Busy));
            }

            let phone = match source {
                PhoneSource::Given(phone) => phone.to_string(),
                PhoneSource::Stored => {
                    if !inner.state.resend_allowed() {
                        tracing::debug!(
                            event = "resend_cooldown_active",
                            resend_available_in = inner.state.resend_available_in(),
                            "Resend refused during cooldown"
                        );
                        return Ok(SendOutcome::Ignored(IgnoreReason::CooldownActive));
                    }
                    inner.state.code.clear();
                    inner.state.phone.clone()
                }
            };

            inner.state.clear_messages();

            if !is_valid_phone(&phone) {
                tracing::warn!(
                    phone = %mask_phone_number(&phone),
                    event = "invalid_phone_format",
                    "Invalid phone number format provided"
                );
                let error = VerificationError::invalid_phone();
                inner.state.last_error = Some(error.clone());
                return Err(error);
            }

            (inner.begin(Operation::Send, None), phone)
        };

        tracing::info!(
            phone = %mask_phone_number(&phone),
            provider = self.service.provider_name(),
            event = "otp_send_requested",
            "Requesting verification code"
        );

        let guard = PendingGuard::new(&self.inner, &fence);
        let request = SendOtpRequest::new(phone.clone(), self.config.preferred_channels.clone());
        let result = self.service.send_otp(&request).await;

        let mut inner = guard.complete();
        if !inner.finish(&fence) {
            tracing::debug!(
                phone = %mask_phone_number(&phone),
                event = "stale_send_response",
                "Ignoring send response for a reset session"
            );
            return Ok(SendOutcome::Ignored(IgnoreReason::Stale));
        }

        let response = match result {
            Ok(response) if !response.request_id.is_empty() => response,
            Ok(_) => {
                tracing::error!(
                    phone = %mask_phone_number(&phone),
                    event = "otp_send_missing_request_id",
                    "Send response carried no request id"
                );
                let error = VerificationError::service_rejected(
                    error_codes::OTP_SEND_FAILED,
                    SEND_FAILED_MESSAGE,
                );
                inner.state.last_error = Some(error.clone());
                return Err(error);
            }
            Err(failure) => {
                tracing::warn!(
                    phone = %mask_phone_number(&phone),
                    error = %failure,
                    event = "otp_send_failed",
                    "Verification code request failed"
                );
                let error = translate_service_failure(failure, SEND_FAILED_MESSAGE);
                inner.state.last_error = Some(error.clone());
                return Err(error);
            }
        };

        tracing::info!(
            phone = %mask_phone_number(&phone),
            request_id = %response.request_id,
            channel = %response.channel,
            ttl_seconds = response.ttl_seconds,
            event = "otp_sent",
            "Verification code sent"
        );
        Self::apply_send(&mut inner.state, phone, response);
        Ok(SendOutcome::Sent)
    }

    fn apply_send(state: &mut SessionState, phone: String, response: SendOtpResponse) {
        state.last_info = Some(format!(
            "OTP sent via {} to {}",
            response.channel.to_uppercase(),
            response.masked_phone
        ));
        state.step = Step::AwaitingCode;
        state.phone = phone;
        state.code.clear();
        state.request_id = response.request_id;
        state.ttl_remaining_seconds = response.ttl_seconds;
        state.remaining_attempts = None;
        state.rate_limits.observe(&response.rate_limits);
    }

    /// Confirm `code` against the current request id
    ///
    /// Expired codes and exhausted attempts send the session back to
    /// [`Step::AwaitingPhone`]; every other failure leaves the step alone so
    /// the user can retry with the same request id.
    pub async fn verify(&self, code: &str) -> SessionResult<VerifyOutcome> {
        let (fence, request) = {
            let mut inner = self.lock();
            if inner.pending.is_some() {
                tracing::debug!(event = "verify_ignored_busy", "Verify ignored while a request is outstanding");
                return Ok(VerifyOutcome::Ignored(IgnoreReason::Busy));
            }

            inner.state.clear_messages();

            if inner.state.step != Step::AwaitingCode {
                let error = VerificationError::code_not_requested();
                inner.state.last_error = Some(error.clone());
                return Err(error);
            }

            if !is_valid_code(code) {
                tracing::warn!(
                    event = "invalid_code_format",
                    code_length = code.len(),
                    "Invalid verification code format provided"
                );
                let error = VerificationError::invalid_code();
                inner.state.last_error = Some(error.clone());
                return Err(error);
            }

            inner.state.code = code.to_string();
            let request = VerifyOtpRequest {
                phone: inner.state.phone.clone(),
                code: code.to_string(),
                request_id: inner.state.request_id.clone(),
            };
            (
                inner.begin(Operation::Verify, Some(request.request_id.clone())),
                request,
            )
        };

        let guard = PendingGuard::new(&self.inner, &fence);
        let result = self.service.verify_otp(&request).await;

        let mut inner = guard.complete();
        if !inner.finish(&fence) {
            tracing::debug!(
                request_id = %request.request_id,
                event = "stale_verify_response",
                "Ignoring verify response for a superseded request"
            );
            return Ok(VerifyOutcome::Ignored(IgnoreReason::Stale));
        }

        match result {
            Ok(response) => Ok(Self::apply_verify(&mut inner.state, &request, response)),
            Err(failure) => {
                let error = translate_service_failure(failure, VERIFY_FAILED_MESSAGE);
                if error.forces_restart() {
                    tracing::warn!(
                        request_id = %request.request_id,
                        kind = ?error.kind(),
                        event = "otp_request_burnt",
                        "Request id can no longer be verified, returning to phone step"
                    );
                    inner.state.restart_from_phone();
                } else {
                    tracing::warn!(
                        request_id = %request.request_id,
                        kind = ?error.kind(),
                        event = "otp_verification_error",
                        "Verification request failed"
                    );
                }
                inner.state.last_error = Some(error.clone());
                Err(error)
            }
        }
    }

    fn apply_verify(
        state: &mut SessionState,
        request: &VerifyOtpRequest,
        response: VerifyOtpResponse,
    ) -> VerifyOutcome {
        if response.verified {
            tracing::info!(
                phone = %mask_phone_number(&request.phone),
                request_id = %request.request_id,
                event = "otp_verified_success",
                "Verification code successfully verified"
            );
            state.last_info = Some(VERIFIED_MESSAGE.to_string());
            return VerifyOutcome::Verified;
        }

        if response.remaining_attempts.is_some() {
            state.remaining_attempts = response.remaining_attempts;
        }
        tracing::warn!(
            request_id = %request.request_id,
            remaining_attempts = ?state.remaining_attempts,
            event = "otp_verification_failed",
            "Verification code rejected"
        );

        let message = if response.message.trim().is_empty() {
            VERIFY_FAILED_MESSAGE.to_string()
        } else {
            response.message
        };
        state.last_error = Some(VerificationError::service_rejected(
            error_codes::OTP_VERIFICATION_FAILED,
            message,
        ));
        VerifyOutcome::Rejected {
            remaining_attempts: state.remaining_attempts,
        }
    }

    /// Count one elapsed second off the code's validity; returns what is left
    pub fn tick(&self) -> u32 {
        self.lock().state.tick()
    }

    /// Return to the initial state from anywhere
    ///
    /// An outstanding call is not cancelled, but its response will be ignored.
    pub fn reset(&self) {
        let mut inner = self.lock();
        if let Some(pending) = inner.pending.take() {
            tracing::debug!(
                operation = ?pending.operation,
                epoch = pending.epoch,
                event = "reset_with_pending_request",
                "Reset while a request is outstanding"
            );
        }
        inner.state = SessionState::default();
        inner.epoch = inner.epoch.wrapping_add(1);
        tracing::info!(event = "session_reset", "Verification session reset");
    }
}
