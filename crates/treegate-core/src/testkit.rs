//! Scripted engine doubles for tests.
//!
//! `MockEngine` hands out monotonically numbered connection ids, replays a
//! fixed outcome (optionally after a delay, to keep a "query" in flight
//! while a test cancels it), and records every kill target and executed
//! statement for assertions.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::engine::{ColumnMeta, Engine, EngineError, Lease, RawCell, ResultSet};

struct MockState {
    next_id: AtomicU64,
    delay: Option<Duration>,
    outcome: Result<ResultSet, EngineError>,
    kills: Mutex<Vec<u64>>,
    statements: Mutex<Vec<String>>,
}

#[derive(Clone)]
pub struct MockEngine {
    state: Arc<MockState>,
}

impl MockEngine {
    pub fn with_result(result: ResultSet) -> Self {
        Self::build(None, Ok(result))
    }

    /// Engine whose queries stay in flight for `delay` before completing.
    pub fn delayed(delay: Duration, result: ResultSet) -> Self {
        Self::build(Some(delay), Ok(result))
    }

    /// Engine whose queries fail with the given error.
    pub fn failing(err: EngineError) -> Self {
        Self::build(None, Err(err))
    }

    fn build(delay: Option<Duration>, outcome: Result<ResultSet, EngineError>) -> Self {
        MockEngine {
            state: Arc::new(MockState {
                next_id: AtomicU64::new(1),
                delay,
                outcome,
                kills: Mutex::new(Vec::new()),
                statements: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Connection identifiers that received a kill, in order.
    pub fn kills(&self) -> Vec<u64> {
        self.state.kills.lock().unwrap().clone()
    }

    /// Statements that reached the engine, in order.
    pub fn statements(&self) -> Vec<String> {
        self.state.statements.lock().unwrap().clone()
    }
}

pub struct MockLease {
    id: u64,
    state: Arc<MockState>,
}

#[async_trait]
impl Lease for MockLease {
    async fn connection_id(&mut self) -> Result<u64, EngineError> {
        Ok(self.id)
    }

    async fn run(self, statement: String) -> Result<ResultSet, EngineError> {
        self.state.statements.lock().unwrap().push(statement);
        if let Some(delay) = self.state.delay {
            tokio::time::sleep(delay).await;
        }
        self.state.outcome.clone()
    }
}

#[async_trait]
impl Engine for MockEngine {
    type Lease = MockLease;

    async fn acquire(&self) -> Result<MockLease, EngineError> {
        Ok(MockLease {
            id: self.state.next_id.fetch_add(1, Ordering::SeqCst),
            state: self.state.clone(),
        })
    }

    async fn kill(&self, connection_id: u64) -> Result<(), EngineError> {
        self.state.kills.lock().unwrap().push(connection_id);
        Ok(())
    }
}

/// Column metadata from `(name, declared type)` pairs.
pub fn columns(specs: &[(&str, &str)]) -> Vec<ColumnMeta> {
    specs
        .iter()
        .map(|(name, type_name)| ColumnMeta {
            name: name.to_string(),
            type_name: type_name.to_string(),
        })
        .collect()
}

/// A raw row from optional UTF-8 cell contents.
pub fn text_row(cells: &[Option<&str>]) -> Vec<RawCell> {
    cells
        .iter()
        .map(|cell| cell.map(|s| s.as_bytes().to_vec()))
        .collect()
}
