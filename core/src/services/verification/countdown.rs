//! Periodic countdown driver for a verification session

use std::sync::{Arc, Weak};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use super::session::VerificationSession;
use super::traits::OtpServiceTrait;

/// One countdown step per second of code validity
pub const COUNTDOWN_PERIOD: Duration = Duration::from_secs(1);

/// Tick `session` once every `period` until it is dropped
///
/// The task holds only a weak reference, so dropping the last `Arc` to the
/// session ends it. Abort the returned handle to stop it earlier.
pub fn spawn_countdown<S>(session: &Arc<VerificationSession<S>>, period: Duration) -> JoinHandle<()>
where
    S: OtpServiceTrait + ?Sized + 'static,
{
    let weak: Weak<VerificationSession<S>> = Arc::downgrade(session);
    tokio::spawn(async move {
        let mut interval = interval_at(Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            interval.tick().await;
            let Some(session) = weak.upgrade() else {
                tracing::debug!(event = "countdown_stopped", "Session dropped, countdown stopped");
                break;
            };
            session.tick();
        }
    })
}
