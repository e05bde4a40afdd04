use core::{future::Future, num::NonZeroUsize};
use std::{process::ExitCode, sync::Arc};

use anyhow::{bail, Result};
use beacon_watcher::{BeaconWatcher, Config as WatcherConfig};
use clap::{Error as ClapError, Parser as _};
use logging::{error_with_head, info_with_head};
use processor::{DataProvider, LoggingHandler, Processor};
use prometheus_metrics::Metrics;
use relay_monitor_version::APPLICATION_NAME_AND_VERSION;
use tokio::runtime::Builder;
use tokio_util::sync::CancellationToken;

use crate::{relay_monitor_args::RelayMonitorArgs, relay_monitor_config::RelayMonitorConfig};

mod relay_monitor_args;
mod relay_monitor_config;

fn main() -> ExitCode {
    if let Err(error) = try_main() {
        error.downcast_ref().map(ClapError::exit);
        error_with_head!("{error:?}");
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn try_main() -> Result<()> {
    binary_utils::initialize_tracing_logger(module_path!(), false)?;

    let args = RelayMonitorArgs::try_parse()?;
    let config = RelayMonitorConfig::load(&args.config)?;

    info_with_head!("starting {APPLICATION_NAME_AND_VERSION}");
    config.report();

    let (watcher_config, feed_capacity) = config.try_into_parts()?;

    block_on(run(watcher_config, feed_capacity))
}

async fn run(watcher_config: WatcherConfig, feed_capacity: NonZeroUsize) -> Result<()> {
    let metrics = Arc::new(Metrics::new()?);

    metrics.register_with_default_metrics()?;

    let watcher = BeaconWatcher::new(watcher_config, Some(Arc::clone(&metrics)))?;
    let providers = vec![Arc::new(watcher) as Arc<dyn DataProvider>];
    let processor = Processor::new(providers, LoggingHandler, feed_capacity, Some(metrics));

    let token = CancellationToken::new();
    let mut processor_task = tokio::spawn(processor.run(token.clone()));

    tokio::select! {
        result = wait_for_signal() => {
            result?;
            info_with_head!("received shutdown signal");
        }
        result = &mut processor_task => {
            result?;
            bail!("every data provider stopped");
        }
    }

    token.cancel();
    processor_task.await?;

    info_with_head!("relay monitor stopped");

    Ok(())
}

async fn wait_for_signal() -> Result<()> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut interrupt = signal(SignalKind::interrupt())?;
        let mut terminate = signal(SignalKind::terminate())?;

        tokio::select! {
            _ = interrupt.recv() => {}
            _ = terminate.recv() => {}
        }
    }

    #[cfg(not(unix))]
    tokio::signal::ctrl_c().await?;

    Ok(())
}

fn block_on(future: impl Future<Output = Result<()>>) -> Result<()> {
    Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(future)
}
