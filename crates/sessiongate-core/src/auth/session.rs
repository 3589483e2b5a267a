//! Session record and the expiry policy that decides whether it is usable.

use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Default session lifetime: one hour.
pub const DEFAULT_SESSION_DURATION_MS: i64 = 3_600_000;

/// Default session lifetime as a `Duration`.
pub fn default_session_duration() -> Duration {
    Duration::milliseconds(DEFAULT_SESSION_DURATION_MS)
}

/// Persisted proof of a successful login plus its expiry instant.
///
/// Serialized as `{"authenticated": true, "expiresAt": <epoch millis>}`.
/// Records written by the older web client used `value`/`expiry`, which are
/// still accepted on read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[cfg_attr(feature = "ts", ts(export))]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    #[serde(alias = "value")]
    pub authenticated: bool,
    #[serde(alias = "expiry", with = "chrono::serde::ts_milliseconds")]
    #[cfg_attr(feature = "ts", ts(type = "number"))]
    pub expires_at: DateTime<Utc>,
}

impl SessionRecord {
    /// Build a fresh authenticated record expiring `duration` after `now`.
    ///
    /// Saturates at the latest representable instant.
    pub fn new(now: DateTime<Utc>, duration: Duration) -> Self {
        Self {
            authenticated: true,
            expires_at: now
                .checked_add_signed(duration)
                .unwrap_or(DateTime::<Utc>::MAX_UTC),
        }
    }

    /// A record is usable only while authenticated and strictly before expiry.
    pub fn is_valid(&self, now: DateTime<Utc>) -> bool {
        self.authenticated && now < self.expires_at
    }

    pub fn time_until_expiry(&self, now: DateTime<Utc>) -> Duration {
        self.expires_at - now
    }

    /// Get minutes remaining until expiry (for display)
    pub fn minutes_until_expiry(&self, now: DateTime<Utc>) -> i64 {
        self.time_until_expiry(now).num_minutes().max(0)
    }
}

/// Free-function form of [`SessionRecord::is_valid`].
pub fn is_valid(record: &SessionRecord, now: DateTime<Utc>) -> bool {
    record.is_valid(now)
}

/// Free-function form of [`SessionRecord::new`].
pub fn new_record(now: DateTime<Utc>, duration: Duration) -> SessionRecord {
    SessionRecord::new(now, duration)
}

/// Source of the current instant.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.lock().unwrap_or_else(|e| e.into_inner()) = now;
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.timestamp_millis_opt(1_700_000_000_000).unwrap()
    }

    #[test]
    fn test_new_record_uses_default_duration() {
        let record = new_record(t0(), default_session_duration());
        assert!(record.authenticated);
        assert_eq!(
            record.expires_at.timestamp_millis(),
            t0().timestamp_millis() + 3_600_000
        );
    }

    #[test]
    fn test_oversized_duration_saturates() {
        let record = new_record(t0(), Duration::MAX);
        assert_eq!(record.expires_at, DateTime::<Utc>::MAX_UTC);
        assert!(record.is_valid(t0()));
        assert!(record.minutes_until_expiry(t0()) > 0);
    }

    #[test]
    fn test_is_valid_before_expiry() {
        let record = new_record(t0(), default_session_duration());
        assert!(is_valid(&record, t0()));
        assert!(is_valid(&record, t0() + Duration::minutes(59)));
    }

    #[test]
    fn test_is_valid_at_and_after_expiry() {
        let record = new_record(t0(), default_session_duration());
        // Expiry instant itself is already invalid
        assert!(!is_valid(&record, record.expires_at));
        assert!(!is_valid(&record, record.expires_at + Duration::milliseconds(1)));
    }

    #[test]
    fn test_unauthenticated_record_is_never_valid() {
        let record = SessionRecord {
            authenticated: false,
            expires_at: t0() + Duration::days(1),
        };
        assert!(!record.is_valid(t0()));
    }

    #[test]
    fn test_minutes_until_expiry_clamps_at_zero() {
        let record = new_record(t0(), Duration::minutes(30));
        assert_eq!(record.minutes_until_expiry(t0()), 30);
        assert_eq!(record.minutes_until_expiry(t0() + Duration::hours(2)), 0);
    }

    #[test]
    fn test_serialized_field_names() {
        let record = new_record(t0(), default_session_duration());
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["authenticated"], true);
        assert_eq!(json["expiresAt"], 1_700_003_600_000_i64);
    }

    #[test]
    fn test_accepts_legacy_field_names() {
        let json = r#"{"value": true, "expiry": 1700003600000}"#;
        let record: SessionRecord = serde_json::from_str(json).unwrap();
        assert!(record.authenticated);
        assert_eq!(record.expires_at.timestamp_millis(), 1_700_003_600_000);
    }

    #[test]
    fn test_manual_clock_advance() {
        let clock = ManualClock::new(t0());
        clock.advance(Duration::seconds(90));
        assert_eq!(clock.now(), t0() + Duration::seconds(90));
        clock.set(t0());
        assert_eq!(clock.now(), t0());
    }
}
