//! Measures how long a request spends inside the router.

use std::fmt;
use std::time::{Duration, Instant};

use time::OffsetDateTime;

/// Started when a request enters the service layer.
///
/// The wall clock start is kept for logging only; elapsed time comes from the monotonic clock.
#[derive(Clone, Copy)]
pub(crate) struct Timer {
    started: Instant,
    started_at: OffsetDateTime,
}

impl Timer {
    pub(crate) fn new() -> Timer {
        Timer {
            started: Instant::now(),
            started_at: OffsetDateTime::now_utc(),
        }
    }

    pub(crate) fn elapsed(&self) -> Timing {
        Timing(self.started.elapsed())
    }

    pub(crate) fn start_time(&self) -> &OffsetDateTime {
        &self.started_at
    }
}

/// An elapsed time, displayed in the largest unit that keeps it readable: `µs`, `ms` or `s`.
#[derive(Clone, Copy)]
pub(crate) struct Timing(Duration);

impl fmt::Display for Timing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let micros = self.0.as_micros();
        if micros < 1_000 {
            write!(f, "{}µs", micros)
        } else if micros < 1_000_000 {
            write!(f, "{:.2}ms", self.0.as_secs_f64() * 1_000.0)
        } else {
            write!(f, "{:.2}s", self.0.as_secs_f64())
        }
    }
}
