use std::time::{SystemTime, UNIX_EPOCH};

/// Source of mutation timestamps.
///
/// Swappable so tests can pin time to fixed values.
pub trait Clock {
    /// Current time as milliseconds since the epoch.
    fn now_ms(&self) -> i64;
}

/// Wall-clock time.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as i64)
            .unwrap_or(0)
    }
}
