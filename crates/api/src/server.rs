//! Bridge server lifecycle.
//!
//! A [`BridgeServer`] moves through `Created -> Running -> Stopped` exactly
//! once. `start` only returns after the listener is bound, so callers can hit
//! the endpoint immediately. `shutdown` is idempotent; `start` is not.

use crate::config::{BridgeConfig, ConfigError};
use crate::sweeper::spawn_expiry_sweeper;
use eabridge_queue::QueueStore;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Lifecycle misuse and startup failures.
#[derive(Debug, thiserror::Error)]
pub enum LifecycleError {
    #[error("bridge server is already running")]
    AlreadyRunning,
    #[error("bridge server has been stopped and cannot be restarted")]
    Stopped,
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },
}

/// Externally visible lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerState {
    Created,
    Running,
    Stopped,
}

struct RunningServer {
    local_addr: SocketAddr,
    shutdown_tx: watch::Sender<bool>,
    serve_task: JoinHandle<()>,
    sweeper_task: Option<JoinHandle<()>>,
}

enum Lifecycle {
    Created,
    Running(RunningServer),
    Stopped,
}

/// HTTP bridge owning one [`QueueStore`] for its whole lifetime.
pub struct BridgeServer {
    config: BridgeConfig,
    store: Arc<QueueStore>,
    lifecycle: Mutex<Lifecycle>,
}

impl BridgeServer {
    pub fn new(config: BridgeConfig) -> Self {
        Self {
            config,
            store: Arc::new(QueueStore::new()),
            lifecycle: Mutex::new(Lifecycle::Created),
        }
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// The queue store served by this bridge.
    pub fn store(&self) -> Arc<QueueStore> {
        Arc::clone(&self.store)
    }

    pub async fn state(&self) -> ServerState {
        match &*self.lifecycle.lock().await {
            Lifecycle::Created => ServerState::Created,
            Lifecycle::Running(_) => ServerState::Running,
            Lifecycle::Stopped => ServerState::Stopped,
        }
    }

    /// Address the listener is bound to, while running.
    pub async fn local_addr(&self) -> Option<SocketAddr> {
        match &*self.lifecycle.lock().await {
            Lifecycle::Running(running) => Some(running.local_addr),
            _ => None,
        }
    }

    /// Bind the listener and begin serving.
    ///
    /// Returns the bound address once the socket is accepting connections.
    /// An invalid config or a bind failure leaves the server in `Created`.
    pub async fn start(&self) -> Result<SocketAddr, LifecycleError> {
        let mut lifecycle = self.lifecycle.lock().await;
        match &*lifecycle {
            Lifecycle::Created => {}
            Lifecycle::Running(_) => return Err(LifecycleError::AlreadyRunning),
            Lifecycle::Stopped => return Err(LifecycleError::Stopped),
        }
        self.config.validate()?;

        let addr = self.config.bind_address();
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|source| LifecycleError::Bind {
                addr: addr.clone(),
                source,
            })?;
        let local_addr = listener
            .local_addr()
            .map_err(|source| LifecycleError::Bind { addr, source })?;

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let router = crate::build_router(Arc::clone(&self.store), &self.config);

        let mut serve_shutdown = shutdown_rx.clone();
        let serve_task = tokio::spawn(async move {
            let signal = async move {
                let _ = serve_shutdown.wait_for(|stopped| *stopped).await;
            };
            if let Err(e) = axum::serve(listener, router)
                .with_graceful_shutdown(signal)
                .await
            {
                error!(error = %e, "Bridge server terminated with error");
            }
        });

        let sweeper_task = self.config.command_ttl().map(|ttl| {
            spawn_expiry_sweeper(
                Arc::clone(&self.store),
                ttl,
                self.config.sweep_interval(),
                shutdown_rx,
            )
        });

        info!(
            addr = %local_addr,
            default_ea_id = %self.config.default_ea_id,
            ttl_secs = ?self.config.command_ttl_secs,
            "Bridge server listening"
        );

        *lifecycle = Lifecycle::Running(RunningServer {
            local_addr,
            shutdown_tx,
            serve_task,
            sweeper_task,
        });
        Ok(local_addr)
    }

    /// Stop accepting connections and wait for in-flight requests.
    ///
    /// Requests still running after the configured grace period are aborted.
    /// A no-op when the server never started or is already stopped.
    ///
    /// The server reports `Stopped` as soon as shutdown begins; the lock is
    /// not held while waiting for the serve task.
    pub async fn shutdown(&self) -> Result<(), LifecycleError> {
        let running = {
            let mut lifecycle = self.lifecycle.lock().await;
            match std::mem::replace(&mut *lifecycle, Lifecycle::Stopped) {
                Lifecycle::Running(running) => running,
                other => {
                    *lifecycle = other;
                    debug!("Shutdown requested on a server that is not running");
                    return Ok(());
                }
            }
        };

        info!(addr = %running.local_addr, "Shutting down bridge server");
        let _ = running.shutdown_tx.send(true);

        let grace = self.config.shutdown_grace();
        let mut serve_task = running.serve_task;
        match tokio::time::timeout(grace, &mut serve_task).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!(error = %e, "Serve task ended abnormally"),
            Err(_) => {
                warn!(
                    grace_secs = grace.as_secs(),
                    "Grace period elapsed, aborting in-flight requests"
                );
                serve_task.abort();
                // Wait for the aborted task so the listener is dropped before returning.
                if let Err(e) = serve_task.await {
                    if !e.is_cancelled() {
                        warn!(error = %e, "Serve task ended abnormally");
                    }
                }
            }
        }

        if let Some(sweeper) = running.sweeper_task {
            if let Err(e) = sweeper.await {
                warn!(error = %e, "Expiry sweeper ended abnormally");
            }
        }

        info!(
            pending = self.store.total_pending(),
            "Bridge server stopped"
        );
        Ok(())
    }
}
