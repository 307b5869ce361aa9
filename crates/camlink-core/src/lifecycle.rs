// ── Lifecycle & triggers ──
//
// Binds a `Merger` to a host: a delayed run after the host's started
// signal, a delayed run if the host was already running, and a manual
// service that runs immediately. Runs are serialized by a single-flight
// gate; overlapping triggers queue behind it.

use std::collections::HashMap;
use std::error::Error as StdError;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use serde::Serialize;
use strum::Display;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::task::{JoinError, JoinHandle, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::correlate::RunReport;
use crate::error::CoreError;
use crate::merger::Merger;

/// Name of the manual update service.
pub const UPDATE_SERVICE: &str = "update_devices";

const SERVICE_CHANNEL_SIZE: usize = 8;
const REPORT_CHANNEL_SIZE: usize = 16;

// ── Host contract ────────────────────────────────────────────────

/// A call to a registered service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceCall {
    pub domain: String,
    pub service: String,
}

/// Capabilities the host process exposes to the component.
pub trait Host: Send + Sync {
    /// Whether the host has already finished starting.
    fn is_running(&self) -> bool;

    /// Resolves once when the host reports it has fully started.
    ///
    /// Dropped without firing if the host never starts.
    fn subscribe_started(&self) -> oneshot::Receiver<()>;

    /// Register a no-argument service and receive its calls.
    fn register_service(&self, domain: &str, service: &str) -> mpsc::Receiver<ServiceCall>;
}

/// In-process host used by the CLI daemon and tests.
#[derive(Default)]
pub struct LocalHost {
    running: AtomicBool,
    started: Mutex<Vec<oneshot::Sender<()>>>,
    services: Mutex<HashMap<(String, String), mpsc::Sender<ServiceCall>>>,
}

impl LocalHost {
    /// A host that has not started yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// A host that is already running.
    pub fn running() -> Self {
        let host = Self::default();
        host.running.store(true, Ordering::SeqCst);
        host
    }

    /// Fire the started signal for every subscriber.
    pub fn mark_started(&self) {
        self.running.store(true, Ordering::SeqCst);
        let subscribers = std::mem::take(
            &mut *self.started.lock().unwrap_or_else(PoisonError::into_inner),
        );
        for tx in subscribers {
            let _ = tx.send(());
        }
    }

    /// Invoke a registered service.
    pub async fn call_service(&self, domain: &str, service: &str) -> Result<(), CoreError> {
        let key = (domain.to_owned(), service.to_owned());
        let tx = self
            .services
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
            .cloned();
        let unknown = || CoreError::UnknownService {
            domain: domain.to_owned(),
            service: service.to_owned(),
        };
        let tx = tx.ok_or_else(unknown)?;
        tx.send(ServiceCall {
            domain: key.0,
            service: key.1,
        })
        .await
        .map_err(|_| unknown())
    }
}

impl Host for LocalHost {
    fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    fn subscribe_started(&self) -> oneshot::Receiver<()> {
        let (tx, rx) = oneshot::channel();
        if !self.is_running() {
            self.started
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(tx);
        }
        rx
    }

    fn register_service(&self, domain: &str, service: &str) -> mpsc::Receiver<ServiceCall> {
        let (tx, rx) = mpsc::channel(SERVICE_CHANNEL_SIZE);
        self.services
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert((domain.to_owned(), service.to_owned()), tx);
        rx
    }
}

// ── Triggered runs ───────────────────────────────────────────────

/// What caused a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Trigger {
    /// Delay elapsed after the host's started signal.
    Startup,
    /// Delay elapsed after loading into an already running host.
    AlreadyRunning,
    /// The manual update service was called.
    Manual,
}

/// Result of one triggered run, broadcast to subscribers.
#[derive(Debug, Clone)]
pub struct TriggeredRun {
    pub trigger: Trigger,
    pub result: Result<RunReport, String>,
}

/// Render an error with its full source chain.
pub fn error_chain(err: &dyn StdError) -> String {
    let mut out = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        out.push_str(": ");
        out.push_str(&cause.to_string());
        source = cause.source();
    }
    out
}

fn log_join(joined: Result<(), JoinError>) {
    if let Err(err) = joined {
        warn!(error = %err, "manual run ended abnormally");
    }
}

#[derive(Clone)]
struct Runner {
    merger: Arc<Merger>,
    gate: Arc<tokio::sync::Mutex<()>>,
    reports: broadcast::Sender<Arc<TriggeredRun>>,
}

impl Runner {
    async fn run(&self, trigger: Trigger) {
        let _permit = self.gate.lock().await;
        info!(%trigger, "running camera update");

        let result = self.merger.run().await.map_err(|err| {
            let chain = error_chain(&err);
            error!(%trigger, error = %chain, "camera update failed");
            chain
        });
        let _ = self.reports.send(Arc::new(TriggeredRun { trigger, result }));
    }

    async fn run_after(&self, trigger: Trigger, delay: Duration, cancel: &CancellationToken) {
        info!(%trigger, delay_secs = delay.as_secs(), "waiting for other integrations to initialize");
        tokio::select! {
            () = cancel.cancelled() => {
                debug!(%trigger, "cancelled before delayed run");
            }
            () = tokio::time::sleep(delay) => self.run(trigger).await,
        }
    }
}

/// A merger bound to a host's triggers.
pub struct Lifecycle {
    runner: Runner,
    cancel: CancellationToken,
    tasks: Vec<JoinHandle<()>>,
}

impl Lifecycle {
    /// Register the manual service, subscribe to the started signal and
    /// schedule the already-running run if applicable.
    pub fn start(merger: Arc<Merger>, host: &dyn Host, cancel: CancellationToken) -> Self {
        let config = merger.config().clone();
        let (reports, _) = broadcast::channel(REPORT_CHANNEL_SIZE);
        let runner = Runner {
            merger,
            gate: Arc::new(tokio::sync::Mutex::new(())),
            reports,
        };
        let mut tasks = Vec::new();

        let mut calls = host.register_service(&config.domain, UPDATE_SERVICE);
        info!(service = %format!("{}.{UPDATE_SERVICE}", config.domain), "service registered");

        // Manual service: each call runs immediately (queued behind the gate).
        {
            let runner = runner.clone();
            let cancel = cancel.clone();
            tasks.push(tokio::spawn(async move {
                let mut runs = JoinSet::new();
                loop {
                    tokio::select! {
                        biased;
                        call = calls.recv() => {
                            let Some(call) = call else { break };
                            debug!(domain = %call.domain, service = %call.service, "manual update triggered");
                            let runner = runner.clone();
                            runs.spawn(async move { runner.run(Trigger::Manual).await });
                        }
                        () = cancel.cancelled() => break,
                        Some(joined) = runs.join_next(), if !runs.is_empty() => log_join(joined),
                    }
                }
                // Calls accepted before cancellation still run.
                while let Ok(call) = calls.try_recv() {
                    debug!(domain = %call.domain, service = %call.service, "manual update accepted before shutdown");
                    let runner = runner.clone();
                    runs.spawn(async move { runner.run(Trigger::Manual).await });
                }
                while let Some(joined) = runs.join_next().await {
                    log_join(joined);
                }
            }));
        }

        // Started signal: fires at most once.
        let started = host.subscribe_started();
        {
            let runner = runner.clone();
            let cancel = cancel.clone();
            let delay = config.startup_delay;
            tasks.push(tokio::spawn(async move {
                tokio::select! {
                    () = cancel.cancelled() => {}
                    signal = started => {
                        if signal.is_ok() {
                            info!("host started, scheduling update");
                            runner.run_after(Trigger::Startup, delay, &cancel).await;
                        }
                    }
                }
            }));
        }

        if host.is_running() {
            info!("host already running, scheduling update");
            let runner = runner.clone();
            let cancel = cancel.clone();
            let delay = config.startup_delay;
            tasks.push(tokio::spawn(async move {
                runner.run_after(Trigger::AlreadyRunning, delay, &cancel).await;
            }));
        } else {
            debug!("host not running yet, waiting for started signal");
        }

        Self {
            runner,
            cancel,
            tasks,
        }
    }

    /// Receive every triggered run's result from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<TriggeredRun>> {
        self.runner.reports.subscribe()
    }

    /// Cancel pending triggers and wait for the trigger tasks to exit.
    ///
    /// A run already past its delay completes before its task exits, as
    /// does every manual call the service accepted before cancellation.
    pub async fn shutdown(self) {
        self.cancel.cancel();
        for task in self.tasks {
            if let Err(err) = task.await {
                warn!(error = %err, "trigger task ended abnormally");
            }
        }
    }
}
