pub use crate::{helpers::start_timer_vec, metrics::Metrics};

mod helpers;
mod metrics;
