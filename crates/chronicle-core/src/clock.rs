//! Clock seam.
//!
//! The dedup window compares wall-clock instants, so the clock is injected
//! rather than read ambiently. Production wiring uses [`SystemClock`]; tests
//! drive a [`ManualClock`] to cross the window deterministically.

use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};

pub trait Clock: Send + Sync {
  fn now(&self) -> DateTime<Utc>;
}

/// Reads the real system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
  fn now(&self) -> DateTime<Utc> { Utc::now() }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
  now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
  pub fn new(start: DateTime<Utc>) -> Self {
    Self { now: Mutex::new(start) }
  }

  pub fn set(&self, to: DateTime<Utc>) {
    *self.now.lock().expect("clock poisoned") = to;
  }

  pub fn advance(&self, by: Duration) {
    let mut now = self.now.lock().expect("clock poisoned");
    *now = *now + by;
  }
}

impl Clock for ManualClock {
  fn now(&self) -> DateTime<Utc> {
    *self.now.lock().expect("clock poisoned")
  }
}
