//! Data-engine collaborator boundary.
//!
//! The engine is a SQL-speaking service reached through a connection pool.
//! The controller needs three capabilities from it: lease a dedicated
//! connection, learn that connection's backend identifier, and kill a
//! running statement by identifier from a *different* connection. Putting a
//! trait at this seam keeps the execution controller testable without a
//! live engine.

pub mod mysql;

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum EngineError {
    /// An error the engine itself reported for the statement, with its
    /// native error code preserved.
    #[error("engine error {code}: {message}")]
    Sql { code: u16, message: String },
    /// Pool, transport, or protocol failure unrelated to the statement.
    #[error("{0}")]
    Internal(String),
}

/// Column metadata as reported by the engine, in result-set order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMeta {
    pub name: String,
    /// Declared type keyword, e.g. `BIGINT`, `TEXT`, `JSON`.
    pub type_name: String,
}

/// Raw wire value for one cell: `None` for SQL NULL, otherwise the textual
/// protocol bytes.
pub type RawCell = Option<Vec<u8>>;

/// A fully fetched result set. Column metadata is present even when no rows
/// matched, and `columns` and each row are parallel and ordered.
#[derive(Debug, Clone, Default)]
pub struct ResultSet {
    pub columns: Vec<ColumnMeta>,
    pub rows: Vec<Vec<RawCell>>,
}

/// One physical connection checked out for the exclusive duration of a
/// request. Dropping a lease returns the connection to the pool.
#[async_trait]
pub trait Lease: Send + 'static {
    /// Resolves the engine-assigned identifier of this exact connection.
    /// The kill path relies on the identifier and the running statement
    /// sharing a connection, so this must be queried on the lease itself.
    async fn connection_id(&mut self) -> Result<u64, EngineError>;

    /// Runs one statement to completion on the leased connection. Consumes
    /// the lease; the connection returns to the pool when the call ends.
    async fn run(self, statement: String) -> Result<ResultSet, EngineError>;
}

#[async_trait]
pub trait Engine: Send + Sync + 'static {
    type Lease: Lease;

    async fn acquire(&self) -> Result<Self::Lease, EngineError>;

    /// Asks the engine to terminate the statement running on the identified
    /// backend connection. Issued over a pool connection of its own, since
    /// the leased one is busy executing.
    async fn kill(&self, connection_id: u64) -> Result<(), EngineError>;
}
