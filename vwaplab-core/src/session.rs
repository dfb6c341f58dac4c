//! Session keying: which trading day a timestamp belongs to.
//!
//! Bars are stamped in exchange-local wall time, so the session is simply the
//! calendar date of the timestamp. `ExchangeClock` does the conversion for
//! source timestamps that carry an explicit UTC offset.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone};
use chrono_tz::Tz;
use std::str::FromStr;
use thiserror::Error;

/// Default exchange timezone.
pub const DEFAULT_TIMEZONE: &str = "America/New_York";

/// Session identity of an exchange-local timestamp.
pub fn session_key(ts: NaiveDateTime) -> NaiveDate {
    ts.date()
}

/// True when `b` opens a different session than `a`.
pub fn is_new_session(a: NaiveDateTime, b: NaiveDateTime) -> bool {
    session_key(a) != session_key(b)
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("unknown timezone '{name}': {reason}")]
    UnknownTimezone { name: String, reason: String },
}

/// Converts offset-bearing timestamps into exchange-local wall time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExchangeClock {
    tz: Tz,
}

impl ExchangeClock {
    pub fn new(tz: Tz) -> Self {
        Self { tz }
    }

    /// Parse an IANA timezone name such as `America/New_York`.
    pub fn from_name(name: &str) -> Result<Self, SessionError> {
        Tz::from_str(name)
            .map(Self::new)
            .map_err(|e| SessionError::UnknownTimezone {
                name: name.to_string(),
                reason: e.to_string(),
            })
    }

    /// Wall-clock time at the exchange for an absolute instant.
    pub fn to_local(&self, ts: DateTime<FixedOffset>) -> NaiveDateTime {
        self.tz.from_utc_datetime(&ts.naive_utc()).naive_local()
    }
}

impl Default for ExchangeClock {
    fn default() -> Self {
        Self {
            tz: chrono_tz::America::New_York,
        }
    }
}
