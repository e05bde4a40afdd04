use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::mpsc::Sender;
use tokio_util::sync::CancellationToken;

use crate::events::MevEvent;

#[async_trait]
pub trait DataProvider: Send + Sync {
    fn name(&self) -> &'static str;

    /// Pushes events into `feed` until `token` is cancelled.
    ///
    /// Implementations must treat a failed send as a shutdown request and return `Ok(())`.
    /// Errors are reserved for failures that prevent the provider from working at all.
    async fn subscribe(&self, feed: Sender<MevEvent>, token: CancellationToken) -> Result<()>;
}
