// ── Presence monitor ──
//
// The refresh loop. Owns the controller session and all presence state;
// one cycle runs to completion before the next tick is considered, so
// nothing here is shared across concurrent cycles.

pub mod bootstrap;

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures_util::future::join_all;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use unipresence_api::{ClientRecord, ControllerClient, TrafficSample};

use crate::config::PresenceConfig;
use crate::error::CoreError;
use crate::matcher;
use crate::model::{Location, PresenceSnapshot, Resident, slugify};
use crate::sink::{self, PresenceSink};

pub use bootstrap::alternate_base_urls;

// ── MonitorState ─────────────────────────────────────────────────────

/// Whether the controller has answered at least once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorState {
    /// No successful probe or fetch yet.
    Uninitialized,
    /// The controller answered; periodic refresh is in steady state.
    Polling,
}

// ── PresenceMonitor ──────────────────────────────────────────────────

/// Polls the controller and keeps resident and location occupancy current.
pub struct PresenceMonitor {
    client: ControllerClient,
    residents: Vec<Resident>,
    locations: Vec<Location>,
    sinks: Vec<Arc<dyn PresenceSink>>,
    global_sink: bool,
    interval: Duration,
    state: watch::Sender<MonitorState>,
    snapshot: watch::Sender<Arc<PresenceSnapshot>>,
}

impl PresenceMonitor {
    /// Validate `config`, build the controller session and the presence
    /// model. Performs no network I/O.
    pub fn new(config: &PresenceConfig) -> Result<Self, CoreError> {
        config.validate()?;
        let client = ControllerClient::new(
            config.url.clone(),
            &config.site,
            &config.credentials,
            &config.transport(),
        )?;
        Ok(Self::with_client(client, config))
    }

    /// Build around an existing session; `config` supplies the model.
    pub fn with_client(client: ControllerClient, config: &PresenceConfig) -> Self {
        let mut seen = HashSet::new();
        let residents = config
            .residents
            .iter()
            .map(|r| Resident::from_config(unique_id("resident", &r.name, &mut seen), r))
            .collect();
        let locations = config
            .locations
            .iter()
            .map(|l| Location::from_config(unique_id("location", &l.name, &mut seen), l))
            .collect();

        let (state, _) = watch::channel(MonitorState::Uninitialized);
        let (snapshot, _) = watch::channel(Arc::new(PresenceSnapshot::default()));

        Self {
            client,
            residents,
            locations,
            sinks: Vec::new(),
            global_sink: config.global_sink,
            interval: config.refresh_interval(),
            state,
            snapshot,
        }
    }

    pub fn add_sink(&mut self, sink: Arc<dyn PresenceSink>) {
        self.sinks.push(sink);
    }

    // ── Observation ──────────────────────────────────────────────────

    pub fn client(&self) -> &ControllerClient {
        &self.client
    }

    pub fn residents(&self) -> &[Resident] {
        &self.residents
    }

    pub fn locations(&self) -> &[Location] {
        &self.locations
    }

    pub fn state(&self) -> MonitorState {
        *self.state.borrow()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<MonitorState> {
        self.state.subscribe()
    }

    /// Latest published snapshot.
    pub fn snapshot(&self) -> Arc<PresenceSnapshot> {
        Arc::clone(&self.snapshot.borrow())
    }

    /// Receives a new snapshot after every cycle.
    pub fn subscribe(&self) -> watch::Receiver<Arc<PresenceSnapshot>> {
        self.snapshot.subscribe()
    }

    fn mark_polling(&self) {
        self.state.send_if_modified(|s| {
            if *s == MonitorState::Polling {
                false
            } else {
                *s = MonitorState::Polling;
                true
            }
        });
    }

    // ── Bootstrap ────────────────────────────────────────────────────

    /// Probe the configured address, then the startup alternates. The
    /// first address that answers becomes the session's address.
    ///
    /// Returns `false` when nothing answered; polling proceeds regardless.
    pub async fn bootstrap(&mut self) -> bool {
        let configured = self.client.base_url().clone();
        if self.client.probe().await {
            info!(url = %configured, backend = %self.client.kind(), "controller reachable");
            self.mark_polling();
            return true;
        }

        for alternate in alternate_base_urls(&configured) {
            let Some(candidate) = self.client.with_base_url(alternate.clone()) else {
                break;
            };
            debug!(url = %alternate, "trying alternate controller address");
            if candidate.probe().await {
                info!(
                    configured = %configured,
                    url = %alternate,
                    "controller reachable at alternate address"
                );
                self.client = candidate;
                self.mark_polling();
                return true;
            }
        }

        warn!(
            url = %configured,
            "controller unreachable; polling will keep retrying"
        );
        false
    }

    // ── Refresh cycle ────────────────────────────────────────────────

    /// Run one refresh cycle and publish its snapshot.
    ///
    /// Fetch failures degrade to empty data. The only error is failed
    /// sink delivery, reported after every sink was called.
    pub async fn run_cycle(&mut self) -> Result<Arc<PresenceSnapshot>, CoreError> {
        let (clients, access_points) = self.client.try_fetch_inventory().await;
        if clients.is_ok() || access_points.is_ok() {
            self.mark_polling();
        }
        let clients = clients.unwrap_or_else(|e| {
            warn!(error = %e, "client fetch failed; treating as empty");
            Vec::new()
        });
        let access_points = access_points.unwrap_or_else(|e| {
            warn!(error = %e, "access point fetch failed; treating as empty");
            Vec::new()
        });
        debug!(
            clients = clients.len(),
            access_points = access_points.len(),
            "fetched controller state"
        );

        // Match every device, then sample traffic for thresholded matches.
        let matches: Vec<Vec<Option<&ClientRecord>>> = self
            .residents
            .iter()
            .map(|r| {
                r.devices
                    .iter()
                    .map(|d| matcher::find_client(d, &clients))
                    .collect()
            })
            .collect();
        let traffic = self.sample_traffic(&matches).await;

        let now = Utc::now();
        for (ri, (resident, matched)) in self.residents.iter_mut().zip(&matches).enumerate() {
            for (di, (device, client)) in resident.devices.iter_mut().zip(matched).enumerate() {
                let was_online = device.online;
                device.update_at(*client, traffic.get(&(ri, di)).copied(), now);
                if device.online != was_online {
                    debug!(
                        resident = %resident.name,
                        device = %device.name,
                        online = device.online,
                        "device presence changed"
                    );
                }
            }
            resident.refresh();
        }

        for location in &mut self.locations {
            location.resolve(&access_points);
            location.refresh(&self.residents);
        }

        let snapshot = Arc::new(PresenceSnapshot::capture(
            &self.residents,
            &self.locations,
            Utc::now(),
        ));
        self.snapshot.send_replace(Arc::clone(&snapshot));

        self.notify_sinks()?;
        Ok(snapshot)
    }

    /// Traffic samples keyed by (resident, device) index, fetched
    /// concurrently for matched devices that carry a threshold.
    async fn sample_traffic(
        &self,
        matches: &[Vec<Option<&ClientRecord>>],
    ) -> HashMap<(usize, usize), TrafficSample> {
        let mut wanted: Vec<((usize, usize), String)> = Vec::new();
        for (ri, (resident, matched)) in self.residents.iter().zip(matches).enumerate() {
            for (di, (device, client)) in resident.devices.iter().zip(matched).enumerate() {
                let Some(client) = client.filter(|_| device.requires_traffic()) else {
                    continue;
                };
                let mac = client
                    .mac
                    .clone()
                    .or_else(|| device.mac.as_ref().map(ToString::to_string));
                if let Some(mac) = mac {
                    wanted.push(((ri, di), mac));
                }
            }
        }
        if wanted.is_empty() {
            return HashMap::new();
        }

        let samples = join_all(
            wanted
                .iter()
                .map(|(_, mac)| self.client.short_window_traffic(mac)),
        )
        .await;

        wanted
            .into_iter()
            .zip(samples)
            .filter_map(|((key, mac), sample)| {
                if sample.is_none() {
                    debug!(mac = %mac, "no traffic sample");
                }
                sample.map(|s| (key, s))
            })
            .collect()
    }

    fn notify_sinks(&self) -> Result<(), CoreError> {
        let mut failed = 0usize;
        for update in sink::updates(&self.residents, &self.locations, self.global_sink) {
            for target in &self.sinks {
                if let Err(e) = target.notify(&update) {
                    warn!(id = %update.id, error = %e, "sink rejected update");
                    failed += 1;
                }
            }
        }
        if failed == 0 {
            Ok(())
        } else {
            Err(CoreError::SinkDelivery { failed })
        }
    }

    // ── Polling loop ─────────────────────────────────────────────────

    /// Bootstrap, then refresh every interval until `cancel` fires. The
    /// first cycle runs immediately.
    pub async fn run(mut self, cancel: CancellationToken) {
        tokio::select! {
            biased;
            () = cancel.cancelled() => return,
            _ = self.bootstrap() => {}
        }

        let mut interval = tokio::time::interval(self.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(interval_secs = self.interval.as_secs(), "presence polling started");

        loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                _ = interval.tick() => {
                    if let Err(e) = self.run_cycle().await {
                        warn!(error = %e, "refresh cycle failed");
                    }
                }
            }
        }
        debug!("presence polling stopped");
    }

    /// Run the polling loop on the current tokio runtime.
    pub fn spawn(self, cancel: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(self.run(cancel))
    }
}

/// `<kind>:<slug>`, suffixed with a counter when the slug is taken.
fn unique_id(kind: &str, name: &str, seen: &mut HashSet<String>) -> String {
    let base = format!("{kind}:{}", slugify(name));
    let mut id = base.clone();
    let mut n = 2u32;
    while !seen.insert(id.clone()) {
        id = format!("{base}-{n}");
        n += 1;
    }
    id
}
