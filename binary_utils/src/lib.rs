use std::io::{self, IsTerminal as _};

use anyhow::Result;
use chrono::{Local, SecondsFormat};
use logging::debug_with_head;
use tracing_subscriber::{
    filter::LevelFilter,
    fmt::{self, format::Writer, time::FormatTime},
    prelude::*,
    EnvFilter, Registry,
};

/// Environment variable with extra filter directives, e.g. `beacon_api=debug,beacon_watcher=trace`.
pub const LOG_ENV_VAR: &str = "RELAY_MONITOR_LOG";

const WORKSPACE_CRATES: &[&str] = &[
    "beacon_api",
    "beacon_watcher",
    "binary_utils",
    "clock",
    "consensus_cache",
    "processor",
    "prometheus_metrics",
];

struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut Writer<'_>) -> core::fmt::Result {
        write!(
            w,
            "[{}]",
            Local::now().to_rfc3339_opts(SecondsFormat::Millis, true)
        )
    }
}

pub fn initialize_tracing_logger(module_path: &str, always_write_style: bool) -> Result<()> {
    let overrides = EnvFilter::try_from_env(LOG_ENV_VAR).ok();
    let filter = build_filter(module_path, overrides.as_ref())?;
    let enable_ansi = always_write_style || io::stdout().is_terminal();

    let stdout_layer = fmt::layer::<Registry>()
        .compact()
        .with_thread_ids(false)
        .with_target(true)
        .with_file(false)
        .with_line_number(true)
        .with_timer(LocalTimer)
        .with_ansi(enable_ansi)
        .with_filter(filter);

    tracing_subscriber::registry().with(stdout_layer).try_init()?;

    debug_with_head!("tracing started!");

    Ok(())
}

/// Logs everything in this workspace at `info` and nothing from dependencies.
///
/// Directives in `overrides` take precedence.
fn build_filter(module_path: &str, overrides: Option<&EnvFilter>) -> Result<EnvFilter> {
    let mut filter = EnvFilter::default()
        .add_directive(LevelFilter::OFF.into())
        .add_directive(format!("{module_path}=info").parse()?);

    for crate_name in WORKSPACE_CRATES {
        filter = filter.add_directive(format!("{crate_name}=info").parse()?);
    }

    if let Some(overrides) = overrides {
        for directive in overrides.to_string().split(',') {
            filter = filter.add_directive(directive.parse()?);
        }
    }

    Ok(filter)
}
