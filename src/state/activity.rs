//! Presence registration, throttled.

use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

use crate::remote::{PresenceHandle, Session};

/// Decides whether an activity signal may fire.
///
/// Fires on the first call and then at most once per `min_interval`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActivityThrottle {
    min_interval: Duration,
    last: Option<Instant>,
}

impl ActivityThrottle {
    /// A throttle that has never fired.
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last: None,
        }
    }

    /// Minimum time between two signals.
    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Whether a signal at `now` goes out. Records it if so.
    pub fn should_fire(&mut self, now: Instant) -> bool {
        let due = match self.last {
            None => true,
            Some(last) => now.saturating_duration_since(last) >= self.min_interval,
        };
        if due {
            self.last = Some(now);
        }
        due
    }
}

/// Tells the server the user is looking at content.
///
/// Best effort: throttled calls are dropped, failures are logged and forgotten.
pub struct ActivityRegistrar {
    service: PresenceHandle,
    session: Session,
    throttle: ActivityThrottle,
}

impl ActivityRegistrar {
    /// Create a registrar sending through `service` at most once per `min_interval`.
    pub fn new(service: PresenceHandle, session: Session, min_interval: Duration) -> Self {
        Self {
            service,
            session,
            throttle: ActivityThrottle::new(min_interval),
        }
    }

    /// Register activity unless one was registered within the interval.
    ///
    /// Returns whether a call was issued. Must run inside a tokio runtime.
    pub fn touch(&mut self) -> bool {
        if !self.throttle.should_fire(Instant::now()) {
            return false;
        }
        let service = self.service.clone();
        let session = self.session.clone();
        tokio::spawn(async move {
            if let Err(err) = service.register_activity(&session).await {
                debug!(error = %err, "presence registration failed");
            }
        });
        true
    }
}

impl std::fmt::Debug for ActivityRegistrar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActivityRegistrar")
            .field("session", &self.session)
            .field("throttle", &self.throttle)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_harness::{session, RecordingService};
    use tokio::time::sleep;

    #[test]
    fn throttle_fires_first_then_waits_for_interval() {
        let mut throttle = ActivityThrottle::new(Duration::from_secs(15));
        let t0 = Instant::now();

        assert!(throttle.should_fire(t0));
        assert!(!throttle.should_fire(t0 + Duration::from_secs(5)));
        assert!(!throttle.should_fire(t0 + Duration::from_millis(14_999)));
        assert!(throttle.should_fire(t0 + Duration::from_secs(15)));
        assert!(!throttle.should_fire(t0 + Duration::from_secs(20)));
    }

    #[test]
    fn dropped_calls_do_not_extend_the_window() {
        let mut throttle = ActivityThrottle::new(Duration::from_secs(10));
        let t0 = Instant::now();

        assert!(throttle.should_fire(t0));
        for s in 1..10 {
            assert!(!throttle.should_fire(t0 + Duration::from_secs(s)));
        }
        assert!(throttle.should_fire(t0 + Duration::from_secs(10)));
    }

    #[test]
    fn zero_interval_always_fires() {
        let mut throttle = ActivityThrottle::new(Duration::ZERO);
        let t0 = Instant::now();
        assert!(throttle.should_fire(t0));
        assert!(throttle.should_fire(t0));
    }

    #[tokio::test(start_paused = true)]
    async fn touch_calls_presence_at_most_once_per_interval() {
        let server = RecordingService::new();
        let mut registrar =
            ActivityRegistrar::new(server.clone(), session(), Duration::from_secs(15));

        assert!(registrar.touch());
        assert!(!registrar.touch());
        sleep(Duration::from_secs(16)).await;
        assert!(registrar.touch());
        sleep(Duration::from_millis(1)).await;

        assert_eq!(server.presence_calls(), 2);
    }
}
