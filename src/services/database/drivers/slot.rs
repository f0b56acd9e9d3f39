//! Shared connection lifecycle for drivers.
//!
//! Each driver keeps its live handle (a pool, a client, an ODBC environment)
//! in a `ConnectionSlot`. The slot enforces the
//! `Unconnected -> Connected -> Closed` progression so individual drivers
//! only deal with opening and closing the handle itself.

use async_lock::RwLock;

use crate::error::{DataError, Result};
use crate::services::database::traits::DriverState;

enum SlotState<T> {
    Unconnected,
    Connected(T),
    Closed,
}

/// Lock-guarded lifecycle cell holding a cloneable connection handle.
pub struct ConnectionSlot<T> {
    inner: RwLock<SlotState<T>>,
}

impl<T> std::fmt::Debug for ConnectionSlot<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionSlot").finish_non_exhaustive()
    }
}

impl<T: Clone> Default for ConnectionSlot<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> ConnectionSlot<T> {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(SlotState::Unconnected),
        }
    }

    pub async fn state(&self) -> DriverState {
        match &*self.inner.read().await {
            SlotState::Unconnected => DriverState::Unconnected,
            SlotState::Connected(_) => DriverState::Connected,
            SlotState::Closed => DriverState::Closed,
        }
    }

    /// Check whether a connect attempt should proceed.
    ///
    /// Returns `Ok(false)` when already connected (connect is a no-op) and
    /// `Err(Closed)` once the slot has been torn down.
    pub async fn should_connect(&self) -> Result<bool> {
        match self.state().await {
            DriverState::Unconnected => Ok(true),
            DriverState::Connected => Ok(false),
            DriverState::Closed => Err(DataError::Closed),
        }
    }

    /// Clone the live handle, or fail `NotConnected`.
    pub async fn get(&self) -> Result<T> {
        match &*self.inner.read().await {
            SlotState::Connected(handle) => Ok(handle.clone()),
            _ => Err(DataError::NotConnected),
        }
    }

    /// Install a freshly opened handle.
    ///
    /// If another caller connected first, the new handle is dropped and the
    /// existing one kept.
    pub async fn install(&self, handle: T) -> Result<()> {
        let mut guard = self.inner.write().await;
        match &*guard {
            SlotState::Unconnected => {
                *guard = SlotState::Connected(handle);
                Ok(())
            }
            SlotState::Connected(_) => Ok(()),
            SlotState::Closed => Err(DataError::Closed),
        }
    }

    /// Remove the live handle for closing; the slot becomes `Closed`.
    pub async fn take(&self) -> Result<T> {
        let mut guard = self.inner.write().await;
        match std::mem::replace(&mut *guard, SlotState::Closed) {
            SlotState::Connected(handle) => Ok(handle),
            previous => {
                *guard = previous;
                Err(DataError::NotConnected)
            }
        }
    }
}
