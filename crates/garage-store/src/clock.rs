use crate::StoreError;
use chrono::{DateTime, Duration, Utc};
use std::sync::{Arc, Mutex, PoisonError};

const MILLIS_PER_HOUR: f64 = 3_600_000.0;

/// Source of the current time. Injected so tests can control elapsed time.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock backed by `chrono::Utc::now`.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn set(&self, to: DateTime<Utc>) {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner) = to;
    }

    /// Move the clock by `by`. Fails, leaving the time unchanged, when the
    /// result falls outside chrono's representable range.
    pub fn advance(&self, by: Duration) -> Result<(), StoreError> {
        let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        *now = now
            .checked_add_signed(by)
            .ok_or(StoreError::ClockOutOfRange)?;
        Ok(())
    }

    /// Advance by fractional hours, rounded to the millisecond.
    pub fn advance_hours(&self, hours: f64) -> Result<(), StoreError> {
        let millis = (hours * MILLIS_PER_HOUR).round();
        if !millis.is_finite() || millis.abs() >= i64::MAX as f64 {
            return Err(StoreError::ClockOutOfRange);
        }
        let by = Duration::try_milliseconds(millis as i64).ok_or(StoreError::ClockOutOfRange)?;
        self.advance(by)
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<C: Clock + ?Sized> Clock for Arc<C> {
    fn now(&self) -> DateTime<Utc> {
        (**self).now()
    }
}

impl<C: Clock + ?Sized> Clock for Box<C> {
    fn now(&self) -> DateTime<Utc> {
        (**self).now()
    }
}
