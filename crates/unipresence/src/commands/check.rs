//! `check`: validate config, bootstrap, report what discovery found.

use unipresence_core::PresenceMonitor;

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

pub async fn handle(global: &GlobalOpts) -> Result<(), CliError> {
    let config = super::load_presence_config(global)?;
    let mut monitor = PresenceMonitor::new(&config)?;

    if !monitor.bootstrap().await {
        return Err(CliError::Unreachable {
            url: config.url.to_string(),
        });
    }

    let client = monitor.client();
    let clients = client.list_active_clients().await.len();
    let access_points = client.list_access_points().await.len();
    let profile = client.profile();
    let clients_at = profile.clients.map(|e| e.display_path(&config.site));
    let devices_at = profile.devices.map(|e| e.display_path(&config.site));
    let devices: usize = monitor.residents().iter().map(|r| r.devices.len()).sum();

    let lines = [
        format!("Controller:  {}", client.base_url()),
        format!("Backend:     {}", client.kind()),
        format!("Site:        {}", config.site),
        format!("Clients at:  {}", clients_at.as_deref().unwrap_or("-")),
        format!("Devices at:  {}", devices_at.as_deref().unwrap_or("-")),
        format!("Seen now:    {clients} client(s), {access_points} access point(s)"),
        format!(
            "Watching:    {} resident(s), {devices} device(s), {} location(s)",
            monitor.residents().len(),
            monitor.locations().len()
        ),
        format!("Interval:    {}s", config.refresh_interval().as_secs()),
    ];
    output::print_output(&lines.join("\n"), global.quiet);
    Ok(())
}
