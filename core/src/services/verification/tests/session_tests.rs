//! Unit tests for the verification session

use std::sync::Arc;
use std::time::Duration;

use crate::domain::{RateLimitSignals, SessionState, Step};
use crate::errors::{
    ErrorKind, ServiceFailure, ATTEMPTS_EXCEEDED_MESSAGE, CODE_NOT_REQUESTED_MESSAGE,
    EXPIRED_MESSAGE, NETWORK_ERROR_MESSAGE, SEND_FAILED_MESSAGE, VERIFY_FAILED_MESSAGE,
};
use crate::services::verification::{
    IgnoreReason, SendOutcome, SessionConfig, VerificationSession, VerifyOutcome,
    VERIFIED_MESSAGE,
};

use super::mocks::{rejected_verify, sent, verified, Gate, ScriptedOtpService, PHONE};

type Session = VerificationSession<ScriptedOtpService>;

fn session() -> (Arc<ScriptedOtpService>, Session) {
    let service = Arc::new(ScriptedOtpService::new());
    let session = VerificationSession::new(service.clone());
    (service, session)
}

/// Session that already holds request `R1` with a full validity window
async fn awaiting_code() -> (Arc<ScriptedOtpService>, Session) {
    let (service, session) = session();
    service.push_send(Ok(sent("R1", 300)));
    assert_eq!(session.send(PHONE).await, Ok(SendOutcome::Sent));
    (service, session)
}

fn tick_times(session: &Session, times: usize) {
    for _ in 0..times {
        session.tick();
    }
}

#[tokio::test]
async fn test_send_success_moves_to_code_step() {
    let (service, session) = session();
    service.push_send(Ok(sent("R1", 300)));

    let outcome = session.send(PHONE).await;
    assert_eq!(outcome, Ok(SendOutcome::Sent));

    let state = session.state();
    assert_eq!(state.step, Step::AwaitingCode);
    assert_eq!(state.request_id, "R1");
    assert_eq!(state.ttl_remaining_seconds, 300);
    assert_eq!(state.phone, PHONE);
    assert_eq!(state.last_info.as_deref(), Some("OTP sent via SMS to 09****5678"));
    assert!(state.last_error.is_none());
    assert_eq!(state.remaining_attempts, None);

    let requests = service.send_requests.lock().unwrap();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].phone, PHONE);
    assert!(requests[0].preferred_channels.is_empty());
}

#[tokio::test]
async fn test_countdown_unlocks_resend_below_threshold() {
    let (service, session) = awaiting_code().await;

    assert!(!session.resend_allowed());
    assert_eq!(
        session.resend_otp().await,
        Ok(SendOutcome::Ignored(IgnoreReason::CooldownActive))
    );
    assert_eq!(service.send_count(), 1);
    assert_eq!(session.view().resend_available_in, 60);

    tick_times(&session, 61);
    assert_eq!(session.state().ttl_remaining_seconds, 239);
    assert!(session.resend_allowed());
    assert!(session.view().resend_allowed);

    service.push_send(Ok(sent("R2", 300)));
    assert_eq!(session.resend_otp().await, Ok(SendOutcome::Sent));
    assert_eq!(service.send_count(), 2);

    let state = session.state();
    assert_eq!(state.request_id, "R2");
    assert_eq!(state.ttl_remaining_seconds, 300);
    assert_eq!(service.send_requests.lock().unwrap()[1].phone, PHONE);
}

#[tokio::test]
async fn test_resend_allowed_exactly_at_threshold() {
    let (_service, session) = awaiting_code().await;

    tick_times(&session, 59);
    assert!(!session.resend_allowed());
    session.tick();
    assert_eq!(session.state().ttl_remaining_seconds, 240);
    assert!(session.resend_allowed());
}

#[tokio::test]
async fn test_cooldown_refusal_leaves_state_untouched() {
    let (_service, session) = awaiting_code().await;
    session.set_code_input("12");
    let before = session.state();

    let outcome = session.resend_otp().await;
    assert_eq!(outcome, Ok(SendOutcome::Ignored(IgnoreReason::CooldownActive)));
    assert_eq!(session.state(), before);
}

#[tokio::test]
async fn test_wrong_code_keeps_code_step() {
    let (service, session) = awaiting_code().await;
    service.push_verify(Ok(rejected_verify("wrong code", Some(2))));

    let outcome = session.verify("000000").await;
    assert_eq!(
        outcome,
        Ok(VerifyOutcome::Rejected {
            remaining_attempts: Some(2)
        })
    );

    let state = session.state();
    assert_eq!(state.step, Step::AwaitingCode);
    assert_eq!(state.request_id, "R1");
    assert_eq!(state.remaining_attempts, Some(2));
    let error = state.last_error.expect("error recorded");
    assert_eq!(error.message(), "wrong code");
    assert_eq!(error.kind(), ErrorKind::ServiceRejected);
    assert_eq!(error.service_code(), Some("10007"));

    let requests = service.verify_requests.lock().unwrap();
    assert_eq!(requests[0].phone, PHONE);
    assert_eq!(requests[0].code, "000000");
    assert_eq!(requests[0].request_id, "R1");
}

#[tokio::test]
async fn test_wrong_code_without_count_keeps_prior_count() {
    let (service, session) = awaiting_code().await;
    service.push_verify(Ok(rejected_verify("wrong code", Some(3))));
    service.push_verify(Ok(rejected_verify("", None)));

    session.verify("000000").await.unwrap();
    let outcome = session.verify("111111").await;

    assert_eq!(
        outcome,
        Ok(VerifyOutcome::Rejected {
            remaining_attempts: Some(3)
        })
    );
    let state = session.state();
    assert_eq!(state.remaining_attempts, Some(3));
    assert_eq!(
        state.last_error.map(|e| e.message().to_string()).as_deref(),
        Some(VERIFY_FAILED_MESSAGE)
    );
}

#[tokio::test]
async fn test_zero_remaining_attempts_is_recorded() {
    let (service, session) = awaiting_code().await;
    service.push_verify(Ok(rejected_verify("wrong code", Some(0))));

    session.verify("000000").await.unwrap();
    assert_eq!(session.state().remaining_attempts, Some(0));
    assert_eq!(session.step(), Step::AwaitingCode);
}

#[tokio::test]
async fn test_expired_code_returns_to_phone_step() {
    let (service, session) = awaiting_code().await;
    service.push_verify(Err(ServiceFailure::rejected("10006", "OTP not found")));

    let error = session.verify("000000").await.unwrap_err();
    assert_eq!(error.kind(), ErrorKind::Expired);
    assert_eq!(error.message(), EXPIRED_MESSAGE);

    let state = session.state();
    assert_eq!(state.step, Step::AwaitingPhone);
    assert!(state.request_id.is_empty());
    assert!(state.code.is_empty());
    assert_eq!(state.ttl_remaining_seconds, 0);
    assert_eq!(state.phone, PHONE);
    assert_eq!(state.last_error, Some(error));
}

#[tokio::test]
async fn test_attempts_exceeded_returns_to_phone_step() {
    let (service, session) = awaiting_code().await;
    service.push_verify(Ok(rejected_verify("wrong code", Some(1))));
    service.push_verify(Err(ServiceFailure::rejected("10008", "Max attempts reached")));

    session.verify("000000").await.unwrap();
    let error = session.verify("000001").await.unwrap_err();
    assert_eq!(error.kind(), ErrorKind::AttemptsExceeded);
    assert_eq!(error.message(), ATTEMPTS_EXCEEDED_MESSAGE);

    let state = session.state();
    assert_eq!(state.step, Step::AwaitingPhone);
    assert!(state.request_id.is_empty());
    assert_eq!(state.remaining_attempts, None);
    assert!(state.rate_limits.is_empty());
}

#[tokio::test]
async fn test_other_verify_failure_allows_retry() {
    let (service, session) = awaiting_code().await;
    service.push_verify(Err(ServiceFailure::Network("timed out".to_string())));
    service.push_verify(Ok(verified()));

    let error = session.verify("123456").await.unwrap_err();
    assert_eq!(error.kind(), ErrorKind::NetworkFailure);
    assert_eq!(error.message(), NETWORK_ERROR_MESSAGE);
    assert_eq!(session.step(), Step::AwaitingCode);
    assert_eq!(session.state().request_id, "R1");

    assert_eq!(session.verify("123456").await, Ok(VerifyOutcome::Verified));
    assert_eq!(service.verify_requests.lock().unwrap()[1].request_id, "R1");
}

#[tokio::test]
async fn test_verified_keeps_code_step() {
    let (_service, session) = awaiting_code().await;

    assert_eq!(session.verify("123456").await, Ok(VerifyOutcome::Verified));

    let state = session.state();
    assert_eq!(state.step, Step::AwaitingCode);
    assert_eq!(state.last_info.as_deref(), Some(VERIFIED_MESSAGE));
    assert!(state.last_error.is_none());
    assert_eq!(state.code, "123456");
}

#[tokio::test]
async fn test_invalid_phone_makes_no_call() {
    let (service, session) = session();

    let error = session.send("123").await.unwrap_err();
    assert_eq!(error.kind(), ErrorKind::InvalidPhone);
    assert_eq!(service.send_count(), 0);

    let state = session.state();
    assert_eq!(state.step, Step::AwaitingPhone);
    assert_eq!(state.last_error.map(|e| e.kind()), Some(ErrorKind::InvalidPhone));
}

#[tokio::test]
async fn test_invalid_phone_in_code_step_keeps_request() {
    let (service, session) = awaiting_code().await;

    let error = session.send("0123456789").await.unwrap_err();
    assert_eq!(error.kind(), ErrorKind::InvalidPhone);
    assert_eq!(service.send_count(), 1);

    let state = session.state();
    assert_eq!(state.step, Step::AwaitingCode);
    assert_eq!(state.request_id, "R1");
    assert!(state.last_info.is_none());
}

#[tokio::test]
async fn test_send_validates_without_normalizing() {
    let (service, session) = session();

    let error = session.send("091 234 5678").await.unwrap_err();
    assert_eq!(error.kind(), ErrorKind::InvalidPhone);
    assert_eq!(service.send_count(), 0);
}

#[tokio::test]
async fn test_invalid_code_makes_no_call() {
    let (service, session) = awaiting_code().await;

    for code in ["", "12345", "1234567", "12a456"] {
        let error = session.verify(code).await.unwrap_err();
        assert_eq!(error.kind(), ErrorKind::InvalidCode);
    }
    assert_eq!(service.verify_count(), 0);
    assert_eq!(session.step(), Step::AwaitingCode);
}

#[tokio::test]
async fn test_verify_before_send_is_local_failure() {
    let (service, session) = session();

    let error = session.verify("123456").await.unwrap_err();
    assert_eq!(error.kind(), ErrorKind::InvalidCode);
    assert_eq!(error.message(), CODE_NOT_REQUESTED_MESSAGE);
    assert_eq!(service.verify_count(), 0);
    assert_eq!(session.step(), Step::AwaitingPhone);
}

#[tokio::test]
async fn test_send_failure_never_advances_step() {
    let (service, session) = session();
    service.push_send(Err(ServiceFailure::Network("connection refused".to_string())));

    let error = session.send(PHONE).await.unwrap_err();
    assert_eq!(error.kind(), ErrorKind::NetworkFailure);

    let state = session.state();
    assert_eq!(state.step, Step::AwaitingPhone);
    assert!(state.request_id.is_empty());
    assert_eq!(state.ttl_remaining_seconds, 0);
}

#[tokio::test]
async fn test_resend_failure_keeps_current_request() {
    let (service, session) = awaiting_code().await;
    tick_times(&session, 100);
    service.push_send(Err(ServiceFailure::rejected(
        "10010",
        "Too many requests for this phone",
    )));

    let error = session.resend_otp().await.unwrap_err();
    assert_eq!(error.kind(), ErrorKind::ServiceRejected);
    assert_eq!(error.service_code(), Some("10010"));
    assert_eq!(error.message(), "Too many requests for this phone");

    let state = session.state();
    assert_eq!(state.step, Step::AwaitingCode);
    assert_eq!(state.request_id, "R1");
    assert_eq!(state.ttl_remaining_seconds, 200);
}

#[tokio::test]
async fn test_rejection_without_message_uses_fallback() {
    let (service, session) = session();
    service.push_send(Err(ServiceFailure::rejected("500", "")));

    let error = session.send(PHONE).await.unwrap_err();
    assert_eq!(error.message(), SEND_FAILED_MESSAGE);
    assert_eq!(error.service_code(), Some("500"));
}

#[tokio::test]
async fn test_send_without_request_id_is_rejected() {
    let (service, session) = session();
    service.push_send(Ok(sent("", 300)));

    let error = session.send(PHONE).await.unwrap_err();
    assert_eq!(error.kind(), ErrorKind::ServiceRejected);
    assert_eq!(error.service_code(), Some("10009"));
    assert_eq!(session.step(), Step::AwaitingPhone);
}

#[tokio::test]
async fn test_new_action_clears_previous_messages() {
    let (_service, session) = session();

    session.send("1").await.unwrap_err();
    assert!(session.state().last_error.is_some());

    session.send(PHONE).await.unwrap();
    let state = session.state();
    assert!(state.last_error.is_none());
    assert!(state.last_info.is_some());

    session.verify("12").await.unwrap_err();
    let state = session.state();
    assert!(state.last_info.is_none());
    assert_eq!(state.last_error.map(|e| e.kind()), Some(ErrorKind::InvalidCode));
}

#[tokio::test]
async fn test_new_send_clears_remaining_attempts() {
    let (service, session) = awaiting_code().await;
    service.push_verify(Ok(rejected_verify("wrong code", Some(4))));
    session.verify("000000").await.unwrap();

    service.push_send(Ok(sent("R2", 300)));
    session.send(PHONE).await.unwrap();
    assert_eq!(session.state().remaining_attempts, None);
}

#[tokio::test]
async fn test_resend_matches_fresh_send() {
    let (service, resent) = awaiting_code().await;
    resent.set_code_input("000000");
    service.push_verify(Ok(rejected_verify("wrong code", Some(4))));
    resent.verify("000000").await.unwrap();
    tick_times(&resent, 90);
    service.push_send(Ok(sent("R2", 300)));
    resent.resend_otp().await.unwrap();

    let (fresh_service, fresh) = session();
    fresh_service.push_send(Ok(sent("R2", 300)));
    fresh.send(PHONE).await.unwrap();

    assert_eq!(resent.state(), fresh.state());
}

#[tokio::test]
async fn test_rate_limits_keep_last_known_values() {
    let (service, session) = session();
    let mut first = sent("R1", 0);
    first.rate_limits = RateLimitSignals::new(Some(4), Some(9));
    let mut second = sent("R2", 300);
    second.rate_limits = RateLimitSignals::new(Some(3), None);
    service.push_send(Ok(first));
    service.push_send(Ok(second));

    session.send(PHONE).await.unwrap();
    assert_eq!(session.view().rate_limits(), (Some(4), Some(9)));

    session.resend_otp().await.unwrap();
    assert_eq!(session.view().rate_limits(), (Some(3), Some(9)));
}

#[tokio::test]
async fn test_reset_returns_initial_state() {
    let (service, session) = awaiting_code().await;
    service.push_verify(Ok(rejected_verify("wrong code", Some(2))));
    session.verify("000000").await.unwrap();
    tick_times(&session, 10);

    session.reset();
    assert_eq!(session.state(), SessionState::default());
    assert!(!session.is_busy());

    session.reset();
    assert_eq!(session.state(), SessionState::default());
}

#[tokio::test]
async fn test_preferred_channels_are_forwarded() {
    let service = Arc::new(ScriptedOtpService::new());
    let config = SessionConfig {
        preferred_channels: vec!["zalo".to_string(), "sms".to_string()],
    };
    let session = VerificationSession::with_config(service.clone(), config);

    session.send(PHONE).await.unwrap();
    assert_eq!(
        service.send_requests.lock().unwrap()[0].preferred_channels,
        vec!["zalo", "sms"]
    );
}

#[tokio::test]
async fn test_input_normalization() {
    let (_service, session) = session();

    assert_eq!(session.set_phone_input("091-234 5678 99"), PHONE);
    assert_eq!(session.state().phone, PHONE);
    assert_eq!(session.set_code_input("12 34-5678"), "123456");
}

#[tokio::test]
async fn test_phone_input_ignored_in_code_step() {
    let (_service, session) = awaiting_code().await;

    assert_eq!(session.set_phone_input("0987654321"), PHONE);
    assert_eq!(session.state().phone, PHONE);
}

#[tokio::test]
async fn test_resend_without_phone_is_invalid() {
    let (service, session) = session();

    let error = session.resend_otp().await.unwrap_err();
    assert_eq!(error.kind(), ErrorKind::InvalidPhone);
    assert_eq!(service.send_count(), 0);
}

#[tokio::test]
async fn test_second_call_while_pending_is_ignored() {
    let gate = Arc::new(Gate::default());
    let service = Arc::new(ScriptedOtpService::gated(gate.clone()));
    let session = Arc::new(VerificationSession::new(service.clone()));

    let pending = tokio::spawn({
        let session = session.clone();
        async move { session.send(PHONE).await }
    });
    gate.entered.notified().await;

    assert!(session.is_busy());
    assert!(session.view().busy);
    assert!(!session.resend_allowed());
    assert_eq!(
        session.send(PHONE).await,
        Ok(SendOutcome::Ignored(IgnoreReason::Busy))
    );
    assert_eq!(
        session.resend_otp().await,
        Ok(SendOutcome::Ignored(IgnoreReason::Busy))
    );
    assert_eq!(
        session.verify("123456").await,
        Ok(VerifyOutcome::Ignored(IgnoreReason::Busy))
    );
    assert_eq!(session.set_phone_input("0987654321"), "");
    assert_eq!(service.send_count(), 1);

    gate.release.notify_one();
    assert_eq!(pending.await.unwrap(), Ok(SendOutcome::Sent));
    assert!(!session.is_busy());
    assert_eq!(session.state().request_id, "R1");
}

#[tokio::test]
async fn test_tick_applies_while_request_pending() {
    let gate = Arc::new(Gate::default());
    let service = Arc::new(ScriptedOtpService::gated(gate.clone()));
    let session = Arc::new(VerificationSession::new(service.clone()));

    let first = tokio::spawn({
        let session = session.clone();
        async move { session.send(PHONE).await }
    });
    gate.entered.notified().await;
    gate.release.notify_one();
    first.await.unwrap().unwrap();

    service.push_verify(Ok(rejected_verify("wrong code", Some(4))));
    let verify = tokio::spawn({
        let session = session.clone();
        async move { session.verify("000000").await }
    });
    gate.entered.notified().await;

    assert_eq!(session.tick(), 299);
    assert_eq!(session.tick(), 298);

    gate.release.notify_one();
    verify.await.unwrap().unwrap();

    let state = session.state();
    assert_eq!(state.ttl_remaining_seconds, 298);
    assert_eq!(state.remaining_attempts, Some(4));
}

#[tokio::test]
async fn test_send_response_after_reset_is_ignored() {
    let gate = Arc::new(Gate::default());
    let service = Arc::new(ScriptedOtpService::gated(gate.clone()));
    let session = Arc::new(VerificationSession::new(service.clone()));

    let pending = tokio::spawn({
        let session = session.clone();
        async move { session.send(PHONE).await }
    });
    gate.entered.notified().await;

    session.reset();
    assert!(!session.is_busy());

    gate.release.notify_one();
    assert_eq!(
        pending.await.unwrap(),
        Ok(SendOutcome::Ignored(IgnoreReason::Stale))
    );
    assert_eq!(session.state(), SessionState::default());
}

#[tokio::test]
async fn test_verify_response_after_reset_and_new_send_is_ignored() {
    let gate = Arc::new(Gate::default());
    let service = Arc::new(ScriptedOtpService::gated(gate.clone()));
    let session = Arc::new(VerificationSession::new(service.clone()));

    let first = tokio::spawn({
        let session = session.clone();
        async move { session.send(PHONE).await }
    });
    gate.entered.notified().await;
    gate.release.notify_one();
    first.await.unwrap().unwrap();

    service.push_verify(Err(ServiceFailure::rejected("10006", "expired")));
    let verify = tokio::spawn({
        let session = session.clone();
        async move { session.verify("000000").await }
    });
    gate.entered.notified().await;

    session.reset();
    let second = tokio::spawn({
        let session = session.clone();
        async move { session.send(PHONE).await }
    });
    gate.entered.notified().await;

    // Both held calls are released; the order they finish in does not matter.
    gate.release.notify_one();
    gate.release.notify_one();
    let verify = verify.await.unwrap();
    let second = second.await.unwrap();

    assert_eq!(verify, Ok(VerifyOutcome::Ignored(IgnoreReason::Stale)));
    assert_eq!(second, Ok(SendOutcome::Sent));
    let state = session.state();
    assert_eq!(state.step, Step::AwaitingCode);
    assert_eq!(state.request_id, "R2");
    assert!(state.last_error.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_dropped_send_frees_the_session() {
    let gate = Arc::new(Gate::default());
    let service = Arc::new(ScriptedOtpService::gated(gate.clone()));
    let session = VerificationSession::new(service.clone());

    let timed_out = tokio::time::timeout(Duration::from_millis(50), session.send(PHONE)).await;
    assert!(timed_out.is_err());
    assert!(!session.is_busy());
    assert_eq!(session.step(), Step::AwaitingPhone);

    gate.release.notify_one();
    assert_eq!(session.send(PHONE).await, Ok(SendOutcome::Sent));
    assert_eq!(service.send_count(), 2);
    assert_eq!(session.state().request_id, "R2");
}

#[tokio::test(start_paused = true)]
async fn test_dropped_verify_allows_retry_with_same_request() {
    let gate = Arc::new(Gate::default());
    let service = Arc::new(ScriptedOtpService::gated(gate.clone()));
    let session = VerificationSession::new(service.clone());

    gate.release.notify_one();
    assert_eq!(session.send(PHONE).await, Ok(SendOutcome::Sent));

    let timed_out = tokio::time::timeout(Duration::from_millis(50), session.verify("123456")).await;
    assert!(timed_out.is_err());
    assert!(!session.is_busy());
    assert_eq!(session.step(), Step::AwaitingCode);

    gate.release.notify_one();
    assert_eq!(session.verify("123456").await, Ok(VerifyOutcome::Verified));
    let requests = service.verify_requests.lock().unwrap();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[1].request_id, "R1");
}

#[tokio::test]
async fn test_dropped_call_from_before_reset_keeps_newer_call_pending() {
    let gate = Arc::new(Gate::default());
    let service = Arc::new(ScriptedOtpService::gated(gate.clone()));
    let session = Arc::new(VerificationSession::new(service.clone()));

    let old = tokio::spawn({
        let session = session.clone();
        async move { session.send(PHONE).await }
    });
    gate.entered.notified().await;

    session.reset();
    let current = tokio::spawn({
        let session = session.clone();
        async move { session.send(PHONE).await }
    });
    gate.entered.notified().await;

    old.abort();
    assert!(old.await.unwrap_err().is_cancelled());
    assert!(session.is_busy());

    gate.release.notify_one();
    assert_eq!(current.await.unwrap(), Ok(SendOutcome::Sent));
    assert!(!session.is_busy());
    assert_eq!(session.state().request_id, "R2");
}
