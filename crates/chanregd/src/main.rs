// # chanregd - Channel Registry Daemon
//
// Thin host for the channel registry. All registry logic lives in
// chanreg-core; this binary only:
// 1. Reads configuration from environment variables
// 2. Initializes tracing
// 3. Opens the persistence store and constructs the registry
// 4. Restores persisted channels and ensures seeded ones exist
// 5. Waits for a shutdown signal, then flushes the store
//
// ## Configuration
//
// - `CHANREG_STORE_TYPE`: Type of persistence store (file, memory)
// - `CHANREG_STORE_PATH`: Path to the store document (for file store)
// - `CHANREG_EVENT_CAPACITY`: Capacity of the registry event channel
// - `CHANREG_SEED_CHANNELS`: Comma-separated channel names to ensure exist
// - `CHANREG_LOG_LEVEL`: trace, debug, info, warn, error
//
// ## Example
//
// ```bash
// export CHANREG_STORE_TYPE=file
// export CHANREG_STORE_PATH=/var/lib/chanreg/channels.json
// export CHANREG_SEED_CHANNELS="BBC One,BBC Two,Channel 4"
//
// chanregd
// ```

use anyhow::Result;
use chanreg_core::{ChannelRegistry, Collaborators, RegistryConfig, RegistryEvent, StoreConfig};
use std::env;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{Level, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

/// Exit codes following systemd conventions
#[derive(Debug, Clone, Copy)]
enum ChanregExitCode {
    /// Clean shutdown (normal exit)
    CleanShutdown = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error (unexpected failure)
    RuntimeError = 2,
}

impl From<ChanregExitCode> for ExitCode {
    fn from(code: ChanregExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Daemon configuration
struct Config {
    store_type: String,
    store_path: Option<String>,
    event_capacity: Option<usize>,
    seed_channels: Vec<String>,
    log_level: String,
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Result<Self> {
        let event_capacity = match env::var("CHANREG_EVENT_CAPACITY") {
            Ok(s) => Some(s.trim().parse().map_err(|e| {
                anyhow::anyhow!("CHANREG_EVENT_CAPACITY '{}' is not a number: {}", s, e)
            })?),
            Err(_) => None,
        };

        Ok(Self {
            store_type: env::var("CHANREG_STORE_TYPE").unwrap_or_else(|_| "file".to_string()),
            store_path: env::var("CHANREG_STORE_PATH").ok(),
            event_capacity,
            seed_channels: parse_channel_list(&env::var("CHANREG_SEED_CHANNELS").unwrap_or_default()),
            log_level: env::var("CHANREG_LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
        })
    }

    /// Validate the configuration
    fn validate(&self) -> Result<()> {
        match self.store_type.as_str() {
            "file" => match self.store_path.as_deref() {
                None | Some("") => anyhow::bail!(
                    "CHANREG_STORE_PATH is required when CHANREG_STORE_TYPE=file. \
                    Set it via: export CHANREG_STORE_PATH=/var/lib/chanreg/channels.json"
                ),
                Some(_) => {}
            },
            "memory" => {}
            other => anyhow::bail!(
                "CHANREG_STORE_TYPE '{}' is not supported. Supported types: file, memory",
                other
            ),
        }

        if let Some(capacity) = self.event_capacity {
            if !(1..=65_536).contains(&capacity) {
                anyhow::bail!(
                    "CHANREG_EVENT_CAPACITY must be between 1 and 65536. Got: {}",
                    capacity
                );
            }
        }

        parse_log_level(&self.log_level)?;
        Ok(())
    }

    /// Registry configuration derived from the daemon configuration
    fn registry_config(&self) -> RegistryConfig {
        let store = match self.store_type.as_str() {
            "file" => StoreConfig::File {
                path: self.store_path.clone().unwrap_or_default(),
            },
            _ => StoreConfig::Memory,
        };

        let mut config = RegistryConfig::new().with_store(store);
        if let Some(capacity) = self.event_capacity {
            config.event_channel_capacity = capacity;
        }
        config
    }
}

/// Split a comma-separated channel list, dropping blanks and duplicates
fn parse_channel_list(raw: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for name in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        if !names.iter().any(|n| n == name) {
            names.push(name.to_string());
        }
    }
    names
}

fn parse_log_level(level: &str) -> Result<Level> {
    match level.to_lowercase().as_str() {
        "trace" => Ok(Level::TRACE),
        "debug" => Ok(Level::DEBUG),
        "info" => Ok(Level::INFO),
        "warn" => Ok(Level::WARN),
        "error" => Ok(Level::ERROR),
        _ => anyhow::bail!(
            "CHANREG_LOG_LEVEL '{}' is not valid. Valid levels: trace, debug, info, warn, error",
            level
        ),
    }
}

fn main() -> ExitCode {
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return ChanregExitCode::ConfigError.into();
        }
    };

    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {}", e);
        return ChanregExitCode::ConfigError.into();
    }

    let log_level = parse_log_level(&config.log_level).unwrap_or(Level::INFO);
    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return ChanregExitCode::ConfigError.into();
    }

    info!("Starting chanregd");

    let registry = match ChannelRegistry::from_config(&config.registry_config(), Collaborators::detached()) {
        Ok(registry) => Arc::new(registry),
        Err(e) => {
            error!("Failed to construct channel registry: {}", e);
            return ChanregExitCode::ConfigError.into();
        }
    };

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return ChanregExitCode::RuntimeError.into();
        }
    };

    let result = rt.block_on(async {
        if let Err(e) = run_daemon(registry, &config).await {
            error!("Daemon error: {}", e);
            ChanregExitCode::RuntimeError
        } else {
            ChanregExitCode::CleanShutdown
        }
    });

    result.into()
}

/// Run the daemon until a shutdown signal arrives
async fn run_daemon(registry: Arc<ChannelRegistry>, config: &Config) -> Result<()> {
    info!("Store type: {}", config.store_type);

    let mut events = registry.subscribe();
    let event_logger = tokio::spawn(async move {
        use tokio::sync::broadcast::error::RecvError;
        loop {
            match events.recv().await {
                Ok(RegistryEvent::Created { tag, name }) => info!("Channel created: '{}' ({})", name, tag),
                Ok(event) => info!("Registry event: {:?}", event),
                Err(RecvError::Lagged(skipped)) => warn!("Event logger lagged, skipped {} event(s)", skipped),
                Err(RecvError::Closed) => break,
            }
        }
    });

    let restored = registry.load()?;
    info!("Restored {} channel(s)", restored);

    for name in &config.seed_channels {
        let channel = registry.find_or_create(name, true)?;
        info!("Managing channel: '{}' ({}, slug '{}')", channel.name, channel.tag, channel.slug);
    }

    info!("Daemon initialized successfully: {} channel(s)", registry.len()?);

    let signal = wait_for_shutdown().await?;
    info!("Received shutdown signal: {}", signal);
    info!("Shutting down daemon");

    event_logger.abort();
    registry.flush()?;
    Ok(())
}

/// Wait for SIGTERM or SIGINT
#[cfg(unix)]
async fn wait_for_shutdown() -> Result<&'static str> {
    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGTERM handler: {}", e))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGINT handler: {}", e))?;

    let signal = tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    };
    Ok(signal)
}

/// Wait for CTRL-C
///
/// Fallback implementation for non-Unix platforms.
#[cfg(not(unix))]
async fn wait_for_shutdown() -> Result<&'static str> {
    tokio::signal::ctrl_c()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to wait for CTRL-C: {}", e))?;
    Ok("SIGINT")
}
