//! `run`: the daemon.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::info;

use unipresence_core::PresenceMonitor;

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::sink::LogSink;

pub async fn handle(global: &GlobalOpts) -> Result<(), CliError> {
    let config = super::load_presence_config(global)?;
    let mut monitor = PresenceMonitor::new(&config)?;
    monitor.add_sink(Arc::new(LogSink::default()));

    info!(
        url = %config.url,
        backend = %config.backend(),
        residents = config.residents.len(),
        locations = config.locations.len(),
        "starting presence monitor"
    );

    let cancel = CancellationToken::new();
    let mut handle = monitor.spawn(cancel.clone());

    tokio::select! {
        signal = tokio::signal::ctrl_c() => {
            signal?;
            info!("interrupt received, shutting down");
            cancel.cancel();
            handle.await?;
        }
        result = &mut handle => result?,
    }
    Ok(())
}
