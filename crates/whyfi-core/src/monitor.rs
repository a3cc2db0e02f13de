// ── Monitor ──
//
// Owns the probes and the metrics store, runs refresh cycles (on demand or
// on a timer) and publishes each cycle's result as one immutable snapshot.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use arc_swap::ArcSwap;
use chrono::Utc;
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::busy::BusyFlag;
use crate::config::MonitorConfig;
use crate::error::CoreError;
use crate::model::{NetworkStatus, ProbeKind, ProbeResult, SpeedTestResult, Suggestion};
use crate::probe::{DnsProbe, PingProbe, RouteTableGateway, SpeedTestProbe};
use crate::process::{CommandRunner, ProcessRunner};
use crate::snapshot::Snapshot;
use crate::source::{GatewaySource, WifiSource};
use crate::store::MetricsStore;

/// What happened to a refresh request.
#[derive(Debug, Clone)]
pub enum RefreshOutcome {
    /// The cycle ran and published this snapshot.
    Completed(Arc<Snapshot>),
    /// Another cycle was already running; nothing was done.
    Skipped,
}

/// Handle to the probe orchestrator. Cheaply cloneable; all clones share
/// the same state and background tasks.
#[derive(Clone)]
pub struct Monitor {
    inner: Arc<MonitorInner>,
}

struct MonitorInner {
    config: MonitorConfig,
    wifi: Arc<dyn WifiSource>,
    gateway: Arc<dyn GatewaySource>,
    ping: PingProbe,
    dns: DnsProbe,
    speed: SpeedTestProbe,
    refreshing: BusyFlag,
    /// Written only by the refresh path.
    metrics: Mutex<MetricsStore>,
    snapshot: ArcSwap<Snapshot>,
    /// Carries the generation of the latest published snapshot.
    changes: watch::Sender<u64>,
    cancel: CancellationToken,
    started: AtomicBool,
    task_handles: Mutex<Vec<JoinHandle<()>>>,
}

impl Monitor {
    /// Monitor backed by real child processes and the routing table.
    ///
    /// Shutting the monitor down also kills any probe still running.
    pub fn new(config: MonitorConfig, wifi: Arc<dyn WifiSource>) -> Result<Self, CoreError> {
        let cancel = CancellationToken::new();
        let runner: Arc<dyn CommandRunner> =
            Arc::new(ProcessRunner::with_cancellation(cancel.child_token()));
        let gateway = Arc::new(RouteTableGateway::new(
            Arc::clone(&runner),
            config.commands.route.clone(),
        ));
        Self::assemble(config, runner, wifi, gateway, cancel)
    }

    /// Monitor with every collaborator supplied by the caller.
    pub fn with_sources(
        config: MonitorConfig,
        runner: Arc<dyn CommandRunner>,
        wifi: Arc<dyn WifiSource>,
        gateway: Arc<dyn GatewaySource>,
    ) -> Result<Self, CoreError> {
        Self::assemble(config, runner, wifi, gateway, CancellationToken::new())
    }

    fn assemble(
        config: MonitorConfig,
        runner: Arc<dyn CommandRunner>,
        wifi: Arc<dyn WifiSource>,
        gateway: Arc<dyn GatewaySource>,
        cancel: CancellationToken,
    ) -> Result<Self, CoreError> {
        config.validate()?;
        let commands = &config.commands;
        let ping = PingProbe::new(Arc::clone(&runner), commands.ping.clone());
        let dns = DnsProbe::new(Arc::clone(&runner), commands.dig.clone());
        let speed = SpeedTestProbe::new(runner, commands.speed_test.clone());
        let (changes, _) = watch::channel(0);

        Ok(Self {
            inner: Arc::new(MonitorInner {
                metrics: Mutex::new(MetricsStore::new(config.history_capacity)),
                snapshot: ArcSwap::from_pointee(Snapshot::initial(config.history_capacity)),
                config,
                wifi,
                gateway,
                ping,
                dns,
                speed,
                refreshing: BusyFlag::default(),
                changes,
                cancel,
                started: AtomicBool::new(false),
                task_handles: Mutex::new(Vec::new()),
            }),
        })
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.inner.config
    }

    /// The most recently published snapshot.
    pub fn snapshot(&self) -> Arc<Snapshot> {
        self.inner.snapshot.load_full()
    }

    /// Receives the generation number of every published snapshot.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.inner.changes.subscribe()
    }

    /// Suggestions for the current snapshot, recomputed on every call.
    pub fn suggestions(&self) -> Vec<Suggestion> {
        self.snapshot().suggestions(&self.inner.config.thresholds)
    }

    pub fn is_refreshing(&self) -> bool {
        self.inner.refreshing.is_busy()
    }

    pub fn is_speed_testing(&self) -> bool {
        self.inner.speed.is_running()
    }

    // ── Refresh cycle ────────────────────────────────────────────────

    /// Run one probe cycle and publish its snapshot. Dropped (not queued)
    /// if a cycle is already running.
    pub async fn refresh(&self) -> RefreshOutcome {
        let Some(_guard) = self.inner.refreshing.try_acquire() else {
            debug!("refresh already in progress, skipping");
            return RefreshOutcome::Skipped;
        };
        let started = Instant::now();
        let inner = &self.inner;
        let config = &inner.config;

        let wifi = inner.wifi.current().await;
        let gateway = inner.gateway.default_gateway().await;

        let router = async {
            match gateway.as_deref() {
                Some(ip) => {
                    inner
                        .ping
                        .measure(ip, config.ping_count, config.ping_timeout)
                        .await
                }
                None => ProbeResult::error("No gateway"),
            }
        };
        let internet = inner
            .ping
            .measure(&config.ping_target, config.ping_count, config.ping_timeout);
        let dns = inner.dns.measure(
            &config.dns_test_domain,
            config.dns_server.as_deref(),
            config.dns_timeout,
        );
        let (router, internet, dns) = tokio::join!(router, internet, dns);

        let metrics = {
            let mut store = inner.metrics.lock().await;
            store.record_latency(ProbeKind::Router, router.latency());
            store.record_latency(ProbeKind::Internet, internet.latency());
            store.record_latency(ProbeKind::Dns, dns.latency());
            store.record_point(router.latency(), internet.latency());
            if wifi.is_connected() {
                store.record_signal(wifi.rssi, wifi.noise);
            }
            Arc::new(store.clone())
        };

        let status = NetworkStatus {
            router,
            internet,
            dns,
            gateway,
        };
        let updated_at = Utc::now();
        let published = inner.publish(|previous| Snapshot {
            wifi: wifi.clone(),
            status: status.clone(),
            metrics: Arc::clone(&metrics),
            speed_test: previous.speed_test.clone(),
            updated_at: Some(updated_at),
            generation: previous.generation + 1,
        });

        #[allow(clippy::cast_possible_truncation, clippy::as_conversions)]
        let elapsed_ms = started.elapsed().as_millis() as u64;
        debug!(
            generation = published.generation,
            elapsed_ms,
            router = ?published.status.router,
            internet = ?published.status.internet,
            dns_ok = published.status.dns.success,
            "refresh cycle complete"
        );
        RefreshOutcome::Completed(published)
    }

    // ── Speed test ───────────────────────────────────────────────────

    /// Run a throughput test and publish its result. Returns `None` when a
    /// test is already running.
    pub async fn run_speed_test(&self) -> Option<SpeedTestResult> {
        let result = self
            .inner
            .speed
            .run(self.inner.config.speed_test_timeout)
            .await;
        if result.is_already_running() {
            debug!("speed test already in progress, skipping");
            return None;
        }
        self.inner.publish(|previous| Snapshot {
            speed_test: Some(result.clone()),
            generation: previous.generation + 1,
            ..previous.clone()
        });
        Some(result)
    }

    // ── Background tasks ─────────────────────────────────────────────

    /// Start the auto-refresh loop. The first cycle runs one interval
    /// after start. Calls after the first are no-ops.
    pub async fn start(&self) {
        if self.inner.started.swap(true, Ordering::AcqRel) {
            debug!("auto refresh already running");
            return;
        }
        let interval = self.inner.config.refresh_interval;
        info!(interval_secs = interval.as_secs(), "starting auto refresh");
        let handle = tokio::spawn(refresh_task(
            self.clone(),
            interval,
            self.inner.cancel.clone(),
        ));
        self.inner.task_handles.lock().await.push(handle);
    }

    /// Stop background refresh and kill in-flight probes. Once this returns
    /// no further cycle starts. A stopped monitor cannot be restarted.
    pub async fn shutdown(&self) {
        self.inner.cancel.cancel();
        let mut handles = self.inner.task_handles.lock().await;
        for handle in handles.drain(..) {
            let _ = handle.await;
        }
        debug!("monitor stopped");
    }
}

impl MonitorInner {
    /// Swap in a snapshot derived from the current one and notify
    /// subscribers. `build` may run more than once under contention.
    fn publish(&self, mut build: impl FnMut(&Snapshot) -> Snapshot) -> Arc<Snapshot> {
        let mut published = None;
        self.snapshot.rcu(|current| {
            let next = Arc::new(build(current));
            published = Some(Arc::clone(&next));
            next
        });
        let published = published.unwrap_or_else(|| self.snapshot.load_full());
        self.changes.send_replace(published.generation);
        published
    }
}

async fn refresh_task(monitor: Monitor, interval: Duration, cancel: CancellationToken) {
    let mut interval = tokio::time::interval(interval);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    interval.tick().await; // consume the immediate first tick

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = interval.tick() => {
                if let RefreshOutcome::Skipped = monitor.refresh().await {
                    debug!("periodic refresh overlapped a manual one");
                }
            }
        }
    }
}
