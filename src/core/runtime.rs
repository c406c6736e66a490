//! Main runtime orchestration.
//!
//! The runtime is the composition root. It builds every component explicitly
//! and hands them to each other:
//! - Start order: storage → registry services → registration listener
//! - Shutdown order: registration listener → storage

use crate::control::{
    GrantAuthorizer, InMemoryNamespaceManager, LoggingRegistrar, RecordingClusterJoin,
};
use crate::core::config::Config;
use crate::registry::NodeStore;
use crate::services::{registration_channel, Collaborators, RegistrationClient, Registry};
use crate::storage::{KvBackend, LogKv, MemoryKv};
use anyhow::{Context, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// How long `stop` waits for the registration listener to drain.
const LISTENER_STOP_TIMEOUT: Duration = Duration::from_secs(5);

/// Component health status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentHealth {
    /// Component is starting.
    Starting,
    /// Component is healthy and operational.
    Healthy,
    /// Component has failed.
    Failed,
    /// Component is stopping.
    Stopping,
    /// Component has stopped.
    Stopped,
}

/// Health status aggregated from all components.
#[derive(Debug, Clone)]
pub struct RuntimeHealth {
    /// Storage backend health.
    pub storage: ComponentHealth,
    /// Registration listener health.
    pub registration: ComponentHealth,
}

impl Default for RuntimeHealth {
    fn default() -> Self {
        Self {
            storage: ComponentHealth::Starting,
            registration: ComponentHealth::Starting,
        }
    }
}

impl RuntimeHealth {
    /// Check if the runtime is ready to serve requests.
    pub fn is_ready(&self) -> bool {
        self.storage == ComponentHealth::Healthy && self.registration == ComponentHealth::Healthy
    }
}

/// Runtime holding all component handles.
pub struct Runtime {
    /// Configuration.
    config: Arc<Config>,

    /// Collaborators injected by the caller; embedded ones are built otherwise.
    collaborators: Option<Collaborators>,

    /// Storage backend.
    kv: Option<Arc<dyn KvBackend>>,

    /// Log backend handle, when the log backend is selected.
    log: Option<Arc<LogKv>>,

    /// Wired services.
    registry: Option<Registry>,

    /// Sender side of the registration channel.
    registration_client: Option<RegistrationClient>,

    /// Registration listener task handle.
    listener_handle: Option<JoinHandle<u64>>,

    /// Runtime health status.
    health: RuntimeHealth,

    /// Whether the runtime is running.
    running: Arc<AtomicBool>,

    /// Shutdown signal sender.
    shutdown_tx: watch::Sender<bool>,

    /// Shutdown signal receiver.
    shutdown_rx: watch::Receiver<bool>,
}

impl Runtime {
    /// Create a new runtime with the given configuration.
    pub fn new(config: Config) -> Result<Self> {
        config.validate().context("invalid configuration")?;

        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        Ok(Self {
            config: Arc::new(config),
            collaborators: None,
            kv: None,
            log: None,
            registry: None,
            registration_client: None,
            listener_handle: None,
            health: RuntimeHealth::default(),
            running: Arc::new(AtomicBool::new(false)),
            shutdown_tx,
            shutdown_rx,
        })
    }

    /// Replace the embedded collaborators with external ones.
    pub fn with_collaborators(mut self, collaborators: Collaborators) -> Self {
        self.collaborators = Some(collaborators);
        self
    }

    /// Get the configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get the wired services (after `start`).
    pub fn registry(&self) -> Option<&Registry> {
        self.registry.as_ref()
    }

    /// Get a registration client (after `start`).
    pub fn registration_client(&self) -> Option<RegistrationClient> {
        self.registration_client.clone()
    }

    /// Get the log backend, if selected and started.
    pub fn log(&self) -> Option<&Arc<LogKv>> {
        self.log.as_ref()
    }

    /// Get the current health status.
    pub fn health(&self) -> &RuntimeHealth {
        &self.health
    }

    /// Check if the runtime is ready to serve requests.
    pub fn is_ready(&self) -> bool {
        self.health.is_ready()
    }

    /// Check if the runtime is running.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Get a shutdown receiver for graceful shutdown coordination.
    pub fn shutdown_receiver(&self) -> watch::Receiver<bool> {
        self.shutdown_rx.clone()
    }

    /// Initialize and start all runtime components.
    ///
    /// Components are started in order:
    /// 1. Storage backend
    /// 2. Registry services and collaborators
    /// 3. Registration listener
    pub async fn start(&mut self) -> Result<()> {
        tracing::info!(
            backend = %self.config.storage.backend,
            "starting node registry runtime"
        );

        // 1. Initialize storage
        self.init_storage()?;

        // 2. Wire services
        self.init_registry()?;

        // 3. Start registration listener
        self.start_registration()?;

        self.running.store(true, Ordering::Release);
        tracing::info!("node registry runtime started");

        Ok(())
    }

    fn init_storage(&mut self) -> Result<()> {
        tracing::debug!("initializing storage backend");

        let kv: Arc<dyn KvBackend> = if self.config.is_durable() {
            let storage = &self.config.storage;
            let log = match LogKv::open(&storage.data_dir, storage.sync_writes) {
                Ok(log) => Arc::new(log),
                Err(e) => {
                    self.health.storage = ComponentHealth::Failed;
                    return Err(e).with_context(|| {
                        format!("failed to open node log in {}", storage.data_dir)
                    });
                }
            };
            let stats = log.stats();
            tracing::info!(
                data_dir = %self.config.storage.data_dir,
                live_keys = stats.live_key_count,
                "node log opened"
            );
            self.log = Some(log.clone());
            log
        } else {
            Arc::new(MemoryKv::new())
        };

        self.kv = Some(kv);
        self.health.storage = ComponentHealth::Healthy;
        Ok(())
    }

    fn init_registry(&mut self) -> Result<()> {
        let kv = self
            .kv
            .clone()
            .context("storage must be initialized before the registry")?;
        let store = Arc::new(NodeStore::new(kv));

        let collaborators = match self.collaborators.take() {
            Some(collaborators) => collaborators,
            None => embedded_collaborators(&self.config),
        };

        self.registry = Some(Registry::new(store, collaborators));
        tracing::info!(
            authorization = %self.config.authorization.mode,
            "registry services wired"
        );
        Ok(())
    }

    fn start_registration(&mut self) -> Result<()> {
        let registry = self
            .registry
            .as_ref()
            .context("registry must be wired before registration")?;

        let (client, listener) = registration_channel(
            registry.registration.clone(),
            self.config.registration.channel_capacity,
            self.shutdown_rx.clone(),
        );
        self.listener_handle = Some(tokio::spawn(listener.run()));
        self.registration_client = Some(client);
        self.health.registration = ComponentHealth::Healthy;

        tracing::info!(
            capacity = self.config.registration.channel_capacity,
            "registration listener started"
        );
        Ok(())
    }

    /// Trigger graceful shutdown.
    pub fn shutdown(&self) {
        tracing::info!("shutdown requested");
        let _ = self.shutdown_tx.send(true);
    }

    /// Run the runtime until SIGINT or a shutdown request.
    pub async fn run(&mut self) -> Result<()> {
        self.start().await?;

        let mut shutdown_rx = self.shutdown_rx.clone();
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::warn!("shutdown signal received (SIGINT)");
            }
            _ = async {
                while !*shutdown_rx.borrow() {
                    if shutdown_rx.changed().await.is_err() {
                        break;
                    }
                }
            } => {
                tracing::info!("shutdown requested by component");
            }
        }

        self.stop().await
    }

    /// Stop all runtime components in reverse start order.
    pub async fn stop(&mut self) -> Result<()> {
        tracing::info!("stopping node registry runtime");
        self.running.store(false, Ordering::Release);

        // Signal shutdown to all components
        let _ = self.shutdown_tx.send(true);

        // 1. Stop registration listener
        self.health.registration = ComponentHealth::Stopping;
        self.registration_client = None;
        if let Some(handle) = self.listener_handle.take() {
            match tokio::time::timeout(LISTENER_STOP_TIMEOUT, handle).await {
                Ok(Ok(handled)) => {
                    tracing::info!(handled, "registration listener stopped");
                }
                Ok(Err(e)) => {
                    tracing::warn!(error = %e, "registration listener task panicked");
                }
                Err(_) => {
                    tracing::warn!("registration listener stop timed out");
                }
            }
        }
        self.health.registration = ComponentHealth::Stopped;

        // 2. Release storage
        self.health.storage = ComponentHealth::Stopping;
        self.registry = None;
        self.kv = None;
        if let Some(log) = self.log.take() {
            tracing::debug!(path = %log.path().display(), "node log closed");
        }
        self.health.storage = ComponentHealth::Stopped;

        tracing::info!("node registry runtime stopped");
        Ok(())
    }
}

/// Build the embedded collaborators described by the configuration.
pub fn embedded_collaborators(config: &Config) -> Collaborators {
    let authorizer = match config.authorization.mode.as_str() {
        "grants" => GrantAuthorizer::with_grants(config.authorization.grants.clone()),
        _ => GrantAuthorizer::permissive(),
    };
    Collaborators {
        authorizer: Arc::new(authorizer),
        registrar: Arc::new(LoggingRegistrar::new()),
        namespaces: Arc::new(InMemoryNamespaceManager::new()),
        cluster: Arc::new(RecordingClusterJoin::new()),
    }
}
