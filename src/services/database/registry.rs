//! Process-wide holder of the active connection.
//!
//! The registry is a single slot guarded by one async mutex. The driver and
//! the configuration it was built from are installed and cleared together.
//! Clones share the same slot, so the shell and the signal thread see one
//! connection.

use std::sync::Arc;
use std::time::Duration;

use async_lock::{Mutex, RwLock, RwLockReadGuard};
use smol::Timer;
use tracing::{info, warn};

use super::drivers::ConnectionFactory;
use super::traits::{BoxedDriver, ConnectionConfig, DialectDriver};
use crate::error::{DataError, Result};

/// A driver shared between the registry and in-flight operations.
type SharedDriver = Arc<RwLock<BoxedDriver>>;

struct Active {
    driver: SharedDriver,
    config: ConnectionConfig,
}

/// Snapshot of the active connection.
///
/// Holding a snapshot does not keep the registry locked; `disconnect` waits
/// for outstanding `driver()` guards before closing.
#[derive(Clone)]
pub struct ActiveConnection {
    driver: SharedDriver,
    pub config: ConnectionConfig,
}

impl ActiveConnection {
    /// Borrow the driver for one or more operations.
    pub async fn driver(&self) -> RwLockReadGuard<'_, BoxedDriver> {
        self.driver.read().await
    }
}

impl std::fmt::Debug for ActiveConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActiveConnection")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Single-slot registry of the current driver.
#[derive(Clone, Default)]
pub struct ConnectionRegistry {
    slot: Arc<Mutex<Option<Active>>>,
}

impl std::fmt::Debug for ConnectionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionRegistry").finish()
    }
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the driver for `config`, connect it, and install it.
    ///
    /// Fails with `AlreadyConnected` if a driver is installed; callers
    /// disconnect first.
    pub async fn connect(&self, config: ConnectionConfig) -> Result<()> {
        let mut slot = self.slot.lock().await;
        if let Some(active) = slot.as_ref() {
            return Err(DataError::AlreadyConnected(active.config.database_type.to_string()));
        }

        let mut driver = ConnectionFactory::create(config.clone())?;
        driver.connect().await?;
        info!(connection = %driver.display_name(), "connection registered");

        *slot = Some(Active {
            driver: Arc::new(RwLock::new(driver)),
            config,
        });
        Ok(())
    }

    /// Connect to `config`, then swap it in and close the previous driver.
    ///
    /// When the new connection fails the previous one stays installed.
    pub async fn switch(&self, config: ConnectionConfig) -> Result<()> {
        let mut driver = ConnectionFactory::create(config.clone())?;
        driver.connect().await?;
        info!(connection = %driver.display_name(), "connection registered");

        let previous = self.slot.lock().await.replace(Active {
            driver: Arc::new(RwLock::new(driver)),
            config,
        });
        if let Some(old) = previous {
            let mut old_driver = old.driver.write().await;
            match old_driver.disconnect().await {
                Ok(()) => info!(connection = %old_driver.display_name(), "connection released"),
                Err(e) => warn!(error = %e, "closing the replaced connection failed"),
            }
        }
        Ok(())
    }

    /// Install a driver that is already connected.
    pub async fn install(&self, driver: BoxedDriver) -> Result<()> {
        let mut slot = self.slot.lock().await;
        if let Some(active) = slot.as_ref() {
            return Err(DataError::AlreadyConnected(active.config.database_type.to_string()));
        }

        let config = driver.connection_config().clone();
        *slot = Some(Active {
            driver: Arc::new(RwLock::new(driver)),
            config,
        });
        Ok(())
    }

    /// Tear down the current driver and clear the slot.
    ///
    /// The slot is cleared even when the driver reports a close error.
    pub async fn disconnect(&self) -> Result<()> {
        let active = self.slot.lock().await.take().ok_or(DataError::NotConnected)?;
        let mut driver = active.driver.write().await;
        let result = driver.disconnect().await;
        info!(connection = %driver.display_name(), "connection released");
        result
    }

    /// Disconnect if connected; an empty slot is not an error.
    pub async fn shutdown(&self) {
        match self.disconnect().await {
            Ok(()) | Err(DataError::NotConnected) => {}
            Err(e) => warn!(error = %e, "disconnect during shutdown failed"),
        }
    }

    /// `shutdown` bounded by `grace`.
    ///
    /// Returns `false` when an in-flight operation still holds the driver
    /// after `grace`. The slot is cleared either way.
    pub async fn shutdown_within(&self, grace: Duration) -> bool {
        let closed = smol::future::or(
            async {
                self.shutdown().await;
                true
            },
            async {
                Timer::after(grace).await;
                false
            },
        )
        .await;
        if !closed {
            warn!(grace_ms = grace.as_millis() as u64, "driver busy; shutdown abandoned");
        }
        closed
    }

    /// Snapshot of the current connection, or `NotConnected`.
    pub async fn current(&self) -> Result<ActiveConnection> {
        let slot = self.slot.lock().await;
        slot.as_ref()
            .map(|active| ActiveConnection {
                driver: active.driver.clone(),
                config: active.config.clone(),
            })
            .ok_or(DataError::NotConnected)
    }

    pub async fn current_config(&self) -> Option<ConnectionConfig> {
        self.slot.lock().await.as_ref().map(|a| a.config.clone())
    }

    pub async fn is_connected(&self) -> bool {
        self.slot.lock().await.is_some()
    }
}
