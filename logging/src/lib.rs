use core::{
    fmt::{Display, Formatter, Result as FmtResult},
    sync::atomic::{AtomicU64, Ordering},
};

pub static HEAD_LOG_METRICS: HeadLogMetrics = HeadLogMetrics::new();

// `u64::MAX` stands for a value that has not been observed yet.
const UNSET: u64 = u64::MAX;

#[derive(Debug)]
pub struct HeadLogMetrics {
    head_slot: AtomicU64,
    current_epoch: AtomicU64,
}

impl Display for HeadLogMetrics {
    fn fmt(&self, formatter: &mut Formatter) -> FmtResult {
        match self.head_slot() {
            Some(slot) => write!(formatter, "head: {slot}")?,
            None => write!(formatter, "head: none")?,
        }

        match self.current_epoch() {
            Some(epoch) => write!(formatter, ", epoch: {epoch}"),
            None => Ok(()),
        }
    }
}

impl HeadLogMetrics {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            head_slot: AtomicU64::new(UNSET),
            current_epoch: AtomicU64::new(UNSET),
        }
    }

    pub fn set_head_slot(&self, head_slot: u64) {
        self.head_slot.store(head_slot, Ordering::Relaxed)
    }

    pub fn set_current_epoch(&self, current_epoch: u64) {
        self.current_epoch.store(current_epoch, Ordering::Relaxed)
    }

    #[must_use]
    pub fn head_slot(&self) -> Option<u64> {
        Some(self.head_slot.load(Ordering::Relaxed)).filter(|slot| *slot != UNSET)
    }

    #[must_use]
    pub fn current_epoch(&self) -> Option<u64> {
        Some(self.current_epoch.load(Ordering::Relaxed)).filter(|epoch| *epoch != UNSET)
    }
}

impl Default for HeadLogMetrics {
    fn default() -> Self {
        Self::new()
    }
}

#[macro_export]
macro_rules! info_with_head {
    ($($arg:tt)*) => {
        ::tracing::info!("[{}] {}", $crate::HEAD_LOG_METRICS, format_args!($($arg)*));
    };
}

#[macro_export]
macro_rules! debug_with_head {
    ($($arg:tt)*) => {
        ::tracing::debug!("[{}] {}", $crate::HEAD_LOG_METRICS, format_args!($($arg)*));
    };
}

#[macro_export]
macro_rules! warn_with_head {
    ($($arg:tt)*) => {
        ::tracing::warn!("[{}] {}", $crate::HEAD_LOG_METRICS, format_args!($($arg)*));
    };
}

#[macro_export]
macro_rules! error_with_head {
    ($($arg:tt)*) => {
        ::tracing::error!("[{}] {}", $crate::HEAD_LOG_METRICS, format_args!($($arg)*));
    };
}

#[macro_export]
macro_rules! trace_with_head {
    ($($arg:tt)*) => {
        ::tracing::trace!("[{}] {}", $crate::HEAD_LOG_METRICS, format_args!($($arg)*));
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_shows_none_before_first_head() {
        let metrics = HeadLogMetrics::new();

        assert_eq!(metrics.to_string(), "head: none");

        metrics.set_current_epoch(3);

        assert_eq!(metrics.to_string(), "head: none, epoch: 3");
    }

    #[test]
    fn prefix_shows_latest_values() {
        let metrics = HeadLogMetrics::new();

        metrics.set_head_slot(100);
        metrics.set_current_epoch(3);
        metrics.set_head_slot(101);

        assert_eq!(metrics.head_slot(), Some(101));
        assert_eq!(metrics.to_string(), "head: 101, epoch: 3");
    }

    #[test]
    fn macros_accept_format_arguments() {
        let slot = 7;

        info_with_head!("head at slot {slot}");
        debug_with_head!("{} events", 2);
        warn_with_head!("plain message");
        error_with_head!("error: {:?}", "value");
        trace_with_head!("trace {slot:>4}");
    }
}
