//! Deterministic clock abstraction for testable expiry logic.

use chrono::{DateTime, Utc};

/// Clock trait for deterministic time in tests.
pub trait Clock: Send + Sync {
    /// Get the current UTC time.
    fn now_utc(&self) -> DateTime<Utc>;
}

/// System clock using actual wall time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_utc(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Mock clock for deterministic testing.
///
/// The registry holds its clock behind an `Arc`, so the mock advances
/// through a shared reference.
#[cfg(any(test, feature = "test-seams"))]
#[derive(Debug)]
pub struct MockClock {
    now: std::sync::Mutex<DateTime<Utc>>,
}

#[cfg(any(test, feature = "test-seams"))]
impl MockClock {
    /// Create a mock clock frozen at the given time.
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: std::sync::Mutex::new(now),
        }
    }

    /// Create a mock clock from an RFC 3339 string.
    pub fn from_rfc3339(s: &str) -> Self {
        Self::new(
            DateTime::parse_from_rfc3339(s)
                .expect("valid RFC 3339")
                .with_timezone(&Utc),
        )
    }

    /// Advance the clock by a duration.
    pub fn advance(&self, duration: chrono::Duration) {
        let mut now = self.now.lock().expect("mock clock lock");
        *now = *now + duration;
    }

    /// Jump the clock to an absolute time.
    pub fn set(&self, to: DateTime<Utc>) {
        *self.now.lock().expect("mock clock lock") = to;
    }
}

#[cfg(any(test, feature = "test-seams"))]
impl Clock for MockClock {
    fn now_utc(&self) -> DateTime<Utc> {
        *self.now.lock().expect("mock clock lock")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;

    #[test]
    fn system_clock_returns_time() {
        let now = SystemClock.now_utc();
        assert!(now.year() >= 2024);
    }

    #[test]
    fn mock_clock_is_deterministic() {
        let clock = MockClock::from_rfc3339("2025-03-01T08:30:00Z");
        assert_eq!(clock.now_utc(), clock.now_utc());
        assert_eq!(clock.now_utc().to_rfc3339(), "2025-03-01T08:30:00+00:00");
    }

    #[test]
    fn mock_clock_advances_through_shared_ref() {
        let clock = std::sync::Arc::new(MockClock::from_rfc3339("2025-03-01T08:30:00Z"));
        let shared = clock.clone();
        shared.advance(chrono::Duration::days(1));
        assert_eq!(clock.now_utc().to_rfc3339(), "2025-03-02T08:30:00+00:00");
    }

    #[test]
    fn mock_clock_set_jumps() {
        let clock = MockClock::from_rfc3339("2025-03-01T08:30:00Z");
        clock.set(DateTime::parse_from_rfc3339("2030-01-01T00:00:00Z").unwrap().with_timezone(&Utc));
        assert_eq!(clock.now_utc().to_rfc3339(), "2030-01-01T00:00:00+00:00");
    }
}
