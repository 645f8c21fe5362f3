//! `status`: one refresh cycle, printed.

use std::collections::HashMap;

use tabled::Tabled;

use unipresence_core::{PresenceMonitor, PresenceSnapshot};

use crate::cli::{GlobalOpts, StatusArgs};
use crate::error::CliError;
use crate::output;

// ── Table rows ──────────────────────────────────────────────────────

#[derive(Tabled)]
struct ResidentRow {
    #[tabled(rename = "Resident")]
    name: String,
    #[tabled(rename = "Home")]
    home: String,
    #[tabled(rename = "Status")]
    summary: String,
}

#[derive(Tabled)]
struct DeviceRow {
    #[tabled(rename = "Resident")]
    resident: String,
    #[tabled(rename = "Device")]
    device: String,
    #[tabled(rename = "Online")]
    online: String,
    #[tabled(rename = "Location")]
    location: String,
    #[tabled(rename = "Traffic (KB)")]
    traffic: String,
    #[tabled(rename = "Last Seen")]
    last_seen: String,
}

#[derive(Tabled)]
struct LocationRow {
    #[tabled(rename = "Location")]
    name: String,
    #[tabled(rename = "AP MAC")]
    mac: String,
    #[tabled(rename = "Occupied")]
    occupied: String,
    #[tabled(rename = "Present")]
    present: String,
}

#[allow(clippy::as_conversions, clippy::cast_precision_loss)]
fn kilobytes(bytes: u64) -> String {
    format!("{:.1}", bytes as f64 / 1024.0)
}

fn render_tables(snapshot: &PresenceSnapshot, color: bool) -> String {
    let room_names: HashMap<&str, &str> = snapshot
        .locations
        .iter()
        .filter_map(|l| l.mac.as_deref().map(|mac| (mac, l.name.as_str())))
        .collect();

    let residents: Vec<ResidentRow> = snapshot
        .residents
        .iter()
        .map(|r| ResidentRow {
            name: r.name.clone(),
            home: output::flag(r.is_home, "yes", "no", color),
            summary: r.summary.clone(),
        })
        .collect();

    let devices: Vec<DeviceRow> = snapshot
        .residents
        .iter()
        .flat_map(|r| r.devices.iter().map(move |d| (r, d)))
        .map(|(r, d)| DeviceRow {
            resident: r.name.clone(),
            device: d.name.clone(),
            online: output::flag(d.online, "online", "offline", color),
            location: d.location.as_deref().map_or_else(String::new, |mac| {
                room_names
                    .get(mac)
                    .map_or_else(|| mac.to_owned(), |name| (*name).to_owned())
            }),
            traffic: kilobytes(d.traffic_bytes),
            last_seen: d.last_seen.map_or_else(
                || "never".into(),
                |t| t.format("%Y-%m-%d %H:%M:%S").to_string(),
            ),
        })
        .collect();

    let mut sections = vec![output::render_table(&residents)];
    if !devices.is_empty() {
        sections.push(output::render_table(&devices));
    }
    if !snapshot.locations.is_empty() {
        let locations: Vec<LocationRow> = snapshot
            .locations
            .iter()
            .map(|l| LocationRow {
                name: l.name.clone(),
                mac: l.mac.clone().unwrap_or_else(|| "unresolved".into()),
                occupied: output::flag(l.occupied, "yes", "no", color),
                present: l.present.join(", "),
            })
            .collect();
        sections.push(output::render_table(&locations));
    }
    sections.push(snapshot.summary.clone());
    sections.join("\n")
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(args: &StatusArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let config = super::load_presence_config(global)?;
    let mut monitor = PresenceMonitor::new(&config)?;

    if !monitor.bootstrap().await {
        return Err(CliError::Unreachable {
            url: config.url.to_string(),
        });
    }
    let snapshot = monitor.run_cycle().await?;

    let out = match output::render_structured(args.output, &*snapshot)? {
        Some(structured) => structured,
        None => render_tables(&snapshot, output::should_color(global.color)),
    };
    output::print_output(&out, global.quiet);
    Ok(())
}
