//! Simulated time.
//!
//! Nothing in the runtime reads a clock. Owners advance time explicitly with `tick` calls and
//! every timeout decision compares an `Instant` recorded earlier against the current one.
use std::fmt;
use std::ops::{Add, Sub};
use std::time::Duration;

/// A point in simulated time, measured from the start of the simulation at full `Duration`
/// precision.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Instant {
    since_start: Duration,
}

impl Instant {
    pub const ZERO: Instant = Instant {
        since_start: Duration::from_secs(0),
    };

    pub fn from_millis(millis: u64) -> Self {
        Instant {
            since_start: Duration::from_millis(millis),
        }
    }

    /// Whole milliseconds since the start, rounded down.
    pub fn millis(self) -> u64 {
        self.since_start.as_millis() as u64
    }

    pub fn since_start(self) -> Duration {
        self.since_start
    }

    /// Time elapsed since `earlier`, saturating at zero.
    pub fn duration_since(self, earlier: Instant) -> Duration {
        self.since_start
            .checked_sub(earlier.since_start)
            .unwrap_or_default()
    }
}

impl Add<Duration> for Instant {
    type Output = Instant;

    fn add(self, rhs: Duration) -> Instant {
        Instant {
            since_start: self.since_start.checked_add(rhs).unwrap_or(Duration::MAX),
        }
    }
}

impl Sub for Instant {
    type Output = Duration;

    fn sub(self, rhs: Instant) -> Duration {
        self.duration_since(rhs)
    }
}

impl fmt::Display for Instant {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:?}", self.since_start)
    }
}
