//! Unix-second timestamps for token lifetimes.
//!
//! Issue and expiry times travel on the wire as plain integers, so the
//! wrapper is `#[serde(transparent)]`. An expiry of zero means the token
//! never expires.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// Seconds since the Unix epoch.
///
/// The zero value is reserved: as an expiry time it means "never expires".
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Timestamp(i64);

impl Timestamp {
    /// The "never expires" sentinel.
    pub const NEVER: Self = Self(0);

    /// Returns the current time.
    #[must_use]
    pub fn now() -> Self {
        let secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system time before Unix epoch")
            .as_secs() as i64;
        Self(secs)
    }

    /// Creates a timestamp from seconds since the Unix epoch.
    #[must_use]
    pub const fn from_secs(secs: i64) -> Self {
        Self(secs)
    }

    /// Returns seconds since the Unix epoch.
    #[must_use]
    pub const fn as_secs(&self) -> i64 {
        self.0
    }

    /// Returns true if this is the "never expires" sentinel.
    #[must_use]
    pub const fn is_never(&self) -> bool {
        self.0 == 0
    }

    /// Returns true if this timestamp lies in the past.
    ///
    /// The `NEVER` sentinel is never in the past.
    #[must_use]
    pub fn is_past(&self) -> bool {
        !self.is_never() && *self < Self::now()
    }

    /// Returns this timestamp shifted by the given number of seconds.
    #[must_use]
    pub const fn offset(&self, secs: i64) -> Self {
        Self(self.0 + secs)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for Timestamp {
    fn from(secs: i64) -> Self {
        Self(secs)
    }
}
