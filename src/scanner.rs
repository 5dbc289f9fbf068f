//! Scan orchestration: one [`ScanSession`] per run.
//!
//! For each resolved IP the session walks the service catalog with
//! sequential HTTP probes, then (optionally) sweeps a wide port set with
//! bounded concurrent TCP connects and re-probes whatever is open for vLLM.
//! Everything the caller sees goes through the session's event stream.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::catalog;
use crate::config::ScanConfig;
use crate::error::ProbeError;
use crate::events::{self, EventSender, EventStream};
use crate::probe::{NetProber, Prober};
use crate::signature;
use crate::target::{self, TargetMode};
use crate::types::{LogLevel, ResultRecord};

const RULE: &str = "========================================";

/// Stop command and status view for a running session. Cheap to clone and
/// safe to use from any task.
#[derive(Debug, Clone)]
pub struct StopHandle {
    cancel: CancellationToken,
    scanning: Arc<AtomicBool>,
}

impl StopHandle {
    /// Request cooperative cancellation. In-flight probes finish; nothing new
    /// is started after the next checkpoint.
    pub fn stop(&self) {
        if !self.cancel.is_cancelled() {
            info!("scan stop requested");
        }
        self.cancel.cancel();
    }

    pub fn is_stop_requested(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// True from the start of `run` until just before its Done event.
    pub fn is_scanning(&self) -> bool {
        self.scanning.load(Ordering::SeqCst)
    }
}

/// Progress counter that only moves forward and keeps 100 for the end.
#[derive(Debug)]
struct Progress {
    percent: u8,
    events: EventSender,
}

impl Progress {
    fn reset(&mut self) {
        self.percent = 0;
        self.events.progress(0);
    }

    fn advance(&mut self, to: usize) {
        let to = to.min(99) as u8;
        if to > self.percent {
            self.percent = to;
            self.events.progress(to);
        }
    }

    fn finish(&mut self) {
        self.percent = 100;
        self.events.progress(100);
    }
}

/// Slice of the 0..100 progress budget owned by one IP.
#[derive(Debug, Clone, Copy)]
struct IpShare {
    base: usize,
    weight: usize,
    /// Full-port sweep enabled: the service checks get the first half of
    /// `weight` and liveness checks the second half.
    split: bool,
}

impl IpShare {
    fn new(index: usize, count: usize, split: bool) -> Self {
        Self {
            base: index * 100 / count,
            weight: 100 / count,
            split,
        }
    }

    fn known(&self, done: usize, total: usize) -> usize {
        let total = total.max(1);
        if self.split {
            self.base + done * self.weight / (2 * total)
        } else {
            self.base + done * self.weight / total
        }
    }

    fn sweep(&self, done: usize, total: usize) -> usize {
        self.base + self.weight / 2 + done * self.weight / (2 * total.max(1))
    }

    fn end(&self) -> usize {
        self.base + self.weight
    }
}

#[derive(Debug)]
struct ScanState {
    progress: Progress,
    results: Vec<ResultRecord>,
    open_ports: BTreeSet<u16>,
}

/// State and collaborators of a single scan run.
pub struct ScanSession<P: Prober = NetProber> {
    config: Arc<ScanConfig>,
    prober: Arc<P>,
    events: EventSender,
    cancel: CancellationToken,
    scanning: Arc<AtomicBool>,
    state: ScanState,
}

impl ScanSession<NetProber> {
    /// Session probing the real network.
    pub fn new(config: ScanConfig) -> Result<(Self, EventStream), ProbeError> {
        let prober = NetProber::new(&config)?;
        Ok(Self::with_prober(config, prober))
    }
}

impl<P: Prober> ScanSession<P> {
    pub fn with_prober(config: ScanConfig, prober: P) -> (Self, EventStream) {
        let (events, stream) = events::channel();
        let session = Self {
            config: Arc::new(config),
            prober: Arc::new(prober),
            cancel: CancellationToken::new(),
            scanning: Arc::new(AtomicBool::new(false)),
            state: ScanState {
                progress: Progress {
                    percent: 0,
                    events: events.clone(),
                },
                results: Vec::new(),
                open_ports: BTreeSet::new(),
            },
            events,
        };
        (session, stream)
    }

    pub fn stop_handle(&self) -> StopHandle {
        StopHandle {
            cancel: self.cancel.clone(),
            scanning: self.scanning.clone(),
        }
    }

    /// Run the scan to completion (or cancellation). Always ends with a Done
    /// event carrying the same list that is returned.
    pub async fn run(mut self, target: &str, mode: TargetMode, full_port_scan: bool) -> Vec<ResultRecord> {
        self.scanning.store(true, Ordering::SeqCst);
        self.state.progress.reset();
        self.events.info(RULE);
        self.events.info("Starting scan");

        let ips = match target::try_resolve(target, mode, self.config.max_targets) {
            Ok(ips) if !ips.is_empty() => ips,
            Ok(_) => return self.reject(target, "target expands to no addresses"),
            Err(e) => return self.reject(target, &e.to_string()),
        };

        self.events.info(format!("Target: {target}"));
        self.events.info(format!("Mode: {}", mode.as_str()));
        self.events.info(format!("IP count: {}", ips.len()));
        self.events.info(format!(
            "Full-port sweep: {}",
            if full_port_scan { "enabled" } else { "disabled" }
        ));
        self.events.info(RULE);
        info!(input = target, mode = mode.as_str(), ips = ips.len(), full_port_scan, "scan started");

        let candidates = if full_port_scan {
            self.config.sweep_candidates()
        } else {
            Vec::new()
        };

        let count = ips.len();
        for (i, ip) in ips.iter().enumerate() {
            if self.cancel.is_cancelled() {
                break;
            }
            let share = IpShare::new(i, count, full_port_scan);

            self.events.info("");
            self.events.info(format!(
                ">>> Scanning [{}/{count}] {ip} ({}%)",
                i + 1,
                (i + 1) * 100 / count
            ));
            self.state.progress.advance(share.base);

            self.events.info(format!("[{ip}] Checking LLM services..."));
            self.sweep_known_services(ip, share).await;

            if full_port_scan && !self.cancel.is_cancelled() {
                self.events.info(format!("[{ip}] Starting full-port sweep..."));
                self.sweep_ports(ip, &candidates, share).await;
            }

            self.state.progress.advance(share.end());
        }

        self.events.info("");
        self.events.info(RULE);
        if self.cancel.is_cancelled() {
            self.events.log(LogLevel::Warning, "Scan cancelled");
        } else if self.state.results.is_empty() {
            self.events.log(LogLevel::Success, "Scan complete! No vulnerabilities found");
        } else {
            self.events.log(
                LogLevel::Error,
                format!("Scan complete! {} vulnerabilities found", self.state.results.len()),
            );
        }
        self.events.info(RULE);
        info!(
            findings = self.state.results.len(),
            open_ports = self.state.open_ports.len(),
            cancelled = self.cancel.is_cancelled(),
            "scan finished"
        );
        self.finish()
    }

    fn reject(self, target: &str, reason: &str) -> Vec<ResultRecord> {
        warn!(input = target, "invalid target: {reason}");
        self.events
            .log(LogLevel::Error, format!("Error: invalid target address ({reason})"));
        self.finish()
    }

    fn finish(mut self) -> Vec<ResultRecord> {
        self.state.progress.finish();
        self.scanning.store(false, Ordering::SeqCst);
        let results = std::mem::take(&mut self.state.results);
        self.events.done(results.clone());
        results
    }

    /// Walk the catalog against one IP, one HTTP request at a time.
    async fn sweep_known_services(&mut self, ip: &str, share: IpShare) {
        let config = Arc::clone(&self.config);
        let total = catalog::total_checks(&config.services);
        let mut done = 0usize;

        'services: for service in &config.services {
            if self.cancel.is_cancelled() {
                break;
            }
            for &port in &service.ports {
                if self.cancel.is_cancelled() {
                    break 'services;
                }
                self.events
                    .info(format!("Checking {ip}:{port} ({})", service.name));

                for path in &service.http_paths {
                    if self.cancel.is_cancelled() {
                        break 'services;
                    }
                    done += 1;
                    self.state.progress.advance(share.known(done, total));

                    let url = format!("http://{ip}:{port}{path}");
                    let Some(body) = self.prober.http_get(&url).await else {
                        continue;
                    };
                    if signature::matches(&body, &service.identifier) {
                        let details = format!(
                            "Unauthenticated {} service detected\nRisk: High\nRecommendation: enable authentication or restrict access",
                            service.name
                        );
                        self.record(ResultRecord::vulnerable(
                            ip,
                            port,
                            &service.name,
                            url,
                            &body,
                            details,
                        ));
                        break;
                    }
                }
            }
        }
    }

    /// Full-port sweep for one IP: liveness first, then vLLM re-probes.
    async fn sweep_ports(&mut self, ip: &str, candidates: &[u16], share: IpShare) {
        self.events.info(format!(
            "[{ip}] Full-port sweep started, {} ports to check",
            candidates.len()
        ));

        let open = self.probe_liveness(ip, candidates, share).await;
        if self.cancel.is_cancelled() {
            return;
        }
        if open.is_empty() {
            self.events
                .info(format!("[{ip}] No additional open ports found"));
            return;
        }
        self.state.open_ports.extend(open.iter().copied());

        let preview: Vec<String> = open.iter().take(10).map(u16::to_string).collect();
        self.events.info(format!(
            "[{ip}] {} open ports: [{}]{}",
            open.len(),
            preview.join(", "),
            if open.len() > 10 { "..." } else { "" }
        ));
        self.events.info(format!("[{ip}] Checking open ports for vLLM..."));

        let config = Arc::clone(&self.config);
        'ports: for &port in &open {
            for path in &config.vllm_paths {
                if self.cancel.is_cancelled() {
                    break 'ports;
                }
                let url = format!("http://{ip}:{port}{path}");
                let Some(body) = self.prober.http_get(&url).await else {
                    continue;
                };
                if signature::is_vllm_response(&body) {
                    if !self.is_recorded(ip, port) {
                        let details = format!(
                            "vLLM service detected on port {port}\nRisk: High\nMatched path: {path}"
                        );
                        self.record(ResultRecord::vulnerable(ip, port, "vLLM", url, &body, details));
                    }
                    break;
                }
            }
        }
    }

    /// Concurrent TCP liveness over `candidates`, bounded by the configured
    /// pool size. Returns open ports in ascending order.
    async fn probe_liveness(&mut self, ip: &str, candidates: &[u16], share: IpShare) -> Vec<u16> {
        let sem = Arc::new(Semaphore::new(self.config.sweep_concurrency.max(1)));
        let mut set = JoinSet::new();

        for &port in candidates {
            let sem = sem.clone();
            let prober = self.prober.clone();
            let cancel = self.cancel.clone();
            let ip = ip.to_string();
            set.spawn(async move {
                let Ok(_permit) = sem.acquire_owned().await else {
                    return (port, false);
                };
                if cancel.is_cancelled() {
                    return (port, false);
                }
                (port, prober.is_open(&ip, port).await)
            });
        }

        let total = candidates.len();
        let mut scanned = 0usize;
        let mut open = Vec::new();
        while let Some(res) = set.join_next().await {
            if self.cancel.is_cancelled() {
                break;
            }
            scanned += 1;
            self.state.progress.advance(share.sweep(scanned, total));
            match res {
                Ok((port, true)) => {
                    open.push(port);
                    self.events.info(format!("[{ip}] Port {port} open"));
                }
                Ok(_) => {}
                Err(e) => debug!(ip, "liveness task failed: {e}"),
            }
        }
        // Dispatched connects run to completion; their answers are dropped.
        while set.join_next().await.is_some() {}

        open.sort_unstable();
        open
    }

    fn is_recorded(&self, ip: &str, port: u16) -> bool {
        self.state
            .results
            .iter()
            .any(|r| r.ip == ip && r.port == port)
    }

    fn record(&mut self, rec: ResultRecord) {
        info!(ip = %rec.ip, port = rec.port, service = %rec.service, "exposed service");
        self.events.log(
            LogLevel::Error,
            format!("[!] Vulnerability found: {} @ {}:{}", rec.service, rec.ip, rec.port),
        );
        self.state.results.push(rec);
    }
}
