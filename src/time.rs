use std::time::{Duration, UNIX_EPOCH};

/// The time elapsed since the unix epoch.
pub fn epoch() -> Duration {
    UNIX_EPOCH
        .elapsed()
        .expect("current time is before unix epoch")
}

/// Elapsed nanoseconds between two [`web_time::Instant`] values, saturating instead of
/// panicking on a clock that runs backward.
pub fn elapsed_ns(start: web_time::Instant) -> u64 {
    u64::try_from(start.elapsed().as_nanos()).unwrap_or(u64::MAX)
}
