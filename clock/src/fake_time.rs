//! A [`WallClock`] that follows Tokio's clock and can be moved arbitrarily.
//!
//! Pausing and advancing time in Tokio has no effect on [`SystemTime`], so tests that need to
//! control wall time use this instead.
//!
//! [`SystemTime`]: std::time::SystemTime

use core::time::Duration;

use anyhow::Result;
use parking_lot::Mutex;
use tokio::time::Instant;

use crate::WallClock;

pub struct FakeWallClock {
    anchor: Mutex<(Duration, Instant)>,
}

impl FakeWallClock {
    pub fn new(since_unix_epoch: Duration) -> Self {
        Self {
            anchor: Mutex::new((since_unix_epoch, Instant::now())),
        }
    }

    /// Moves the clock to `since_unix_epoch`. The clock keeps running from there.
    pub fn set(&self, since_unix_epoch: Duration) {
        *self.anchor.lock() = (since_unix_epoch, Instant::now());
    }
}

impl WallClock for FakeWallClock {
    fn since_unix_epoch(&self) -> Result<Duration> {
        let (since_unix_epoch, instant) = *self.anchor.lock();
        Ok(since_unix_epoch + instant.elapsed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn fake_wall_clock_follows_tokio_time() -> Result<()> {
        let clock = FakeWallClock::new(Duration::from_secs(1000));

        tokio::time::advance(Duration::from_secs(5)).await;

        assert_eq!(clock.since_unix_epoch()?, Duration::from_secs(1005));

        clock.set(Duration::from_secs(10));
        tokio::time::advance(Duration::from_secs(1)).await;

        assert_eq!(clock.since_unix_epoch()?, Duration::from_secs(11));

        Ok(())
    }
}
