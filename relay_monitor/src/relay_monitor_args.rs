use std::path::PathBuf;

use clap::Parser;
use relay_monitor_version::{APPLICATION_NAME, APPLICATION_VERSION};

const DEFAULT_CONFIG_PATH: &str = "config.example.yaml";

/// Monitors MEV relays against the consensus chain observed through a beacon node
#[derive(Parser)]
#[clap(display_name = APPLICATION_NAME, version = APPLICATION_VERSION)]
pub struct RelayMonitorArgs {
    /// Path to the YAML configuration file
    #[clap(long, default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,
}
