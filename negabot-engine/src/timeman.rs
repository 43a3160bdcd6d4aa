//! Time Management

use std::time::{Duration, Instant};

/// Default time budget per move.
pub const DEFAULT_BUDGET: Duration = Duration::from_secs(30);

/// An absolute point in time after which a search must stop, or none for
/// a search without a time limit.
///
/// A deadline is computed once when a search call starts, so every part of
/// that call measures against the same instant.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub struct Deadline {
    start_time: Instant,
    end_time: Option<Instant>,
}

impl Deadline {
    /// Returns a deadline `budget` from now, or an infinite deadline for None.
    pub fn after(budget: Option<Duration>) -> Self {
        let start_time = Instant::now();
        Self {
            start_time,
            end_time: budget.and_then(|budget| start_time.checked_add(budget)),
        }
    }

    /// Returns a deadline that never passes.
    pub fn infinite() -> Self {
        Self::after(None)
    }

    /// Time elapsed since the deadline was created.
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Returns true if there is no time limit.
    pub fn is_infinite(&self) -> bool {
        self.end_time.is_none()
    }

    /// Returns the time left, or None for an infinite deadline.
    /// A deadline that has passed has zero time remaining.
    pub fn remaining(&self) -> Option<Duration> {
        self.end_time
            .map(|end_time| end_time.saturating_duration_since(Instant::now()))
    }

    /// Returns true if the deadline has been reached.
    pub fn is_past(&self) -> bool {
        matches!(self.remaining(), Some(remaining) if remaining.is_zero())
    }
}
