//! In-memory driver used by unit tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::error::{DataError, Result};
use crate::services::database::traits::{
    ColumnDescriptor, ConnectionConfig, DatabaseType, DialectDriver, DriverState, Row, Value,
};

/// A scripted driver that records the statements it is asked to run.
pub struct FakeDriver {
    config: ConnectionConfig,
    state: Mutex<DriverState>,
    pub closes: Arc<AtomicUsize>,
    pub executed: Arc<Mutex<Vec<(String, Vec<Value>)>>>,
    pub rows: Vec<Row>,
    pub descriptors: Vec<ColumnDescriptor>,
    /// `None` makes `get_table_columns` fail
    pub columns: Option<Vec<String>>,
}

impl FakeDriver {
    pub fn new() -> Self {
        Self {
            config: ConnectionConfig::new(DatabaseType::MySQL, "fake", 3306, "tester", "pw", "fakedb"),
            state: Mutex::new(DriverState::Unconnected),
            closes: Arc::new(AtomicUsize::new(0)),
            executed: Arc::new(Mutex::new(Vec::new())),
            rows: Vec::new(),
            descriptors: Vec::new(),
            columns: Some(Vec::new()),
        }
    }

    pub fn connected() -> Self {
        let driver = Self::new();
        *driver.state.lock().unwrap() = DriverState::Connected;
        driver
    }

    fn ensure_connected(&self) -> Result<()> {
        match *self.state.lock().unwrap() {
            DriverState::Connected => Ok(()),
            _ => Err(DataError::NotConnected),
        }
    }
}

#[async_trait]
impl DialectDriver for FakeDriver {
    fn database_type(&self) -> DatabaseType {
        self.config.database_type
    }

    fn connection_config(&self) -> &ConnectionConfig {
        &self.config
    }

    async fn state(&self) -> DriverState {
        *self.state.lock().unwrap()
    }

    async fn connect(&mut self) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        match *state {
            DriverState::Closed => Err(DataError::Closed),
            _ => {
                *state = DriverState::Connected;
                Ok(())
            }
        }
    }

    async fn disconnect(&mut self) -> Result<()> {
        self.ensure_connected()?;
        *self.state.lock().unwrap() = DriverState::Closed;
        self.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn query_with_params(&self, sql: &str, params: &[Value]) -> Result<Vec<Row>> {
        self.ensure_connected()?;
        self.executed
            .lock()
            .unwrap()
            .push((sql.to_string(), params.to_vec()));
        Ok(self.rows.clone())
    }

    async fn execute_with_params(&self, sql: &str, params: &[Value]) -> Result<u64> {
        self.ensure_connected()?;
        self.executed
            .lock()
            .unwrap()
            .push((sql.to_string(), params.to_vec()));
        Ok(1)
    }

    async fn get_tables(&self) -> Result<Vec<String>> {
        self.ensure_connected()?;
        Ok(vec!["fake_table".to_string()])
    }

    async fn describe_table(&self, _table: &str) -> Result<Vec<ColumnDescriptor>> {
        self.ensure_connected()?;
        Ok(self.descriptors.clone())
    }

    async fn get_table_columns(&self, _table: &str) -> Result<Vec<String>> {
        self.ensure_connected()?;
        self.columns
            .clone()
            .ok_or_else(|| DataError::query("catalog unavailable"))
    }
}
