//! Fixed-rate tick scheduler used by every control loop of the crate
//!
//! The ticker sleeps until the next deadline instead of sleeping a fixed duration, so the work done in an iteration
//! does not make the loop drift.

use std::time::Duration;

use tokio::time::{sleep_until, Instant};

use crate::{Error, Result};

fn invalid_rate(rate_hz: f64) -> Error {
    Error::InvalidArgument(format!(
        "rate must be a positive number of Hz with a representable period, got {}",
        rate_hz
    ))
}

/// Check that a rate can be used to build a [Ticker]
pub(crate) fn check_rate(rate_hz: f64) -> Result<()> {
    Ticker::every(rate_hz).map(drop)
}

/// Number of ticks that fit in `duration_s` at `rate_hz`
pub(crate) fn tick_count(rate_hz: f64, duration_s: f64) -> u64 {
    let ticks = (rate_hz * duration_s).round();
    if ticks.is_finite() && ticks > 0.0 {
        ticks as u64
    } else {
        0
    }
}

#[derive(Debug)]
pub(crate) struct Ticker {
    period: Duration,
    deadline: Instant,
}

impl Ticker {
    /// Ticker firing `rate_hz` times per second, the first tick is one period from now
    ///
    /// Fails with [Error::InvalidArgument] when `rate_hz` is not positive and finite, or when its period does not fit
    /// in a [Duration] or an [Instant].
    pub(crate) fn every(rate_hz: f64) -> Result<Self> {
        if !(rate_hz.is_finite() && rate_hz > 0.0) {
            return Err(invalid_rate(rate_hz));
        }
        let period =
            Duration::try_from_secs_f64(1.0 / rate_hz).map_err(|_| invalid_rate(rate_hz))?;
        let deadline = Instant::now()
            .checked_add(period)
            .ok_or_else(|| invalid_rate(rate_hz))?;

        Ok(Self { period, deadline })
    }

    /// Sleep until the next tick
    pub(crate) async fn tick(&mut self) {
        sleep_until(self.deadline).await;

        let now = Instant::now();
        self.deadline = match self.deadline.checked_add(self.period) {
            Some(next) if next >= now => next,
            // Re-base on the current time when an iteration overran its period
            _ => now.checked_add(self.period).unwrap_or(now),
        };
    }
}
