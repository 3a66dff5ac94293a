//! Time sources for signing and verification.

use {
    chrono::{DateTime, Utc},
    std::fmt::Debug,
};

/// A source of the current UTC instant.
///
/// Signing and verification read the clock once per operation so that every derived string uses the same
/// timestamp.
pub trait Clock: Debug + Send + Sync {
    /// Return the current instant.
    fn now(&self) -> DateTime<Utc>;
}

/// The system wall clock.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    #[inline(always)]
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock pinned to a single instant, for deterministic signing and tests.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct FixedClock(DateTime<Utc>);

impl FixedClock {
    /// Create a clock that always returns `instant`.
    pub const fn new(instant: DateTime<Utc>) -> Self {
        Self(instant)
    }
}

impl Clock for FixedClock {
    #[inline(always)]
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

impl From<DateTime<Utc>> for FixedClock {
    fn from(instant: DateTime<Utc>) -> Self {
        Self(instant)
    }
}
