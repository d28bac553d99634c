//! Query execution and cancellation controller.
//!
//! Per request: lease a dedicated connection, resolve its backend
//! identifier, run the rewritten statement on a background task, and race
//! the completion signal against the caller's cancellation token. The
//! driver only stops *waiting* on cancellation; the engine keeps processing
//! until it receives an explicit `KILL`, which is why the kill step is the
//! system's only true cancellation mechanism.

use std::sync::Arc;

use log::{debug, warn};
use thiserror::Error;
use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;

use crate::engine::{Engine, EngineError, Lease, ResultSet};
use crate::rewrite;
use crate::typemap::{self, ScanError};
use crate::value::{CellValue, Row};

#[derive(Debug, Error)]
pub enum QueryError {
    /// The caller abandoned the request while the query was in flight.
    /// Distinct from timeouts and SQL errors so callers can detect aborts.
    #[error("query cancelled by the client")]
    Cancelled,
    /// The engine rejected the statement; the native error code travels to
    /// the response envelope.
    #[error("{message}")]
    Sql { code: u16, message: String },
    /// Pool exhaustion, identifier resolution, decoding - anything that is
    /// not the caller's fault. Details are logged, not surfaced.
    #[error("{0}")]
    Internal(String),
}

impl QueryError {
    /// Connection acquisition and identifier resolution happen before the
    /// statement runs; their failures are internal, never SQL errors.
    fn internal(err: EngineError) -> Self {
        QueryError::Internal(err.to_string())
    }

    fn from_engine(err: EngineError) -> Self {
        match err {
            EngineError::Sql { code, message } => QueryError::Sql { code, message },
            other => QueryError::Internal(other.to_string()),
        }
    }
}

impl From<ScanError> for QueryError {
    fn from(err: ScanError) -> Self {
        QueryError::Internal(err.to_string())
    }
}

/// Fully decoded result of one request.
#[derive(Debug, Default)]
pub struct QueryOutput {
    pub headers: Vec<String>,
    pub types: Vec<String>,
    pub rows: Vec<Row>,
    /// Whether the rewriter applied the row cap to the statement.
    pub limit_applied: bool,
}

pub struct QueryExecutor<E: Engine> {
    engine: Arc<E>,
}

impl<E: Engine> QueryExecutor<E> {
    pub fn new(engine: Arc<E>) -> Self {
        QueryExecutor { engine }
    }

    /// Runs one statement and materializes its decoded rows.
    ///
    /// When `token` fires while the query is in flight, the backend
    /// statement is killed by the identifier resolved on this request's own
    /// lease - concurrent requests can never kill each other's queries -
    /// and `QueryError::Cancelled` is returned. The background task is left
    /// to finish on its own; its result is discarded and the leased
    /// connection returns to the pool when it does.
    pub async fn execute(
        &self,
        token: &CancellationToken,
        statement: &str,
        limit: i64,
    ) -> Result<QueryOutput, QueryError> {
        let (statement, limit_applied) = rewrite::add_limit(statement, limit);

        let mut lease = self.engine.acquire().await.map_err(QueryError::internal)?;
        let connection_id = lease.connection_id().await.map_err(QueryError::internal)?;
        debug!("executing on backend connection {connection_id}: {statement}");

        let (done_tx, done_rx) = oneshot::channel();
        tokio::spawn(async move {
            // Receiver may be gone if the request was cancelled.
            let _ = done_tx.send(lease.run(statement).await);
        });

        let completion = tokio::select! {
            _ = token.cancelled() => None,
            res = done_rx => Some(res),
        };

        // A completion and a cancellation can race at the boundary: the
        // channel may deliver a result even though the caller has already
        // gone away. The cancellation state decides the path.
        if token.is_cancelled() {
            if let Err(err) = self.engine.kill(connection_id).await {
                warn!("failed to kill backend connection {connection_id}: {err}");
            }
            return Err(QueryError::Cancelled);
        }

        let result = match completion {
            Some(Ok(engine_result)) => engine_result.map_err(QueryError::from_engine)?,
            Some(Err(_)) => {
                return Err(QueryError::Internal(
                    "query task dropped its completion signal".to_string(),
                ))
            }
            // The cancelled branch won the select but the token reports no
            // cancellation; not reachable with a real token.
            None => return Err(QueryError::Cancelled),
        };

        materialize(result, limit_applied)
    }
}

/// Decodes every cell of the fetched result set, inserting the sidecar
/// raw-bytes entry right after each tree-valued column.
fn materialize(result: ResultSet, limit_applied: bool) -> Result<QueryOutput, QueryError> {
    let headers: Vec<String> = result.columns.iter().map(|c| c.name.clone()).collect();
    let types: Vec<String> = result.columns.iter().map(|c| c.type_name.clone()).collect();

    let mut rows = Vec::with_capacity(result.rows.len());
    for raw_row in result.rows {
        if raw_row.len() != result.columns.len() {
            return Err(QueryError::Internal(format!(
                "engine returned a row of width {} for {} columns",
                raw_row.len(),
                result.columns.len()
            )));
        }

        let mut row = Row::new();
        for (meta, cell) in result.columns.iter().zip(raw_row) {
            let decoded = typemap::decode_cell(&meta.name, &meta.type_name, cell.as_deref())?;
            row.insert(meta.name.clone(), decoded.value);
            if let Some(raw) = decoded.tree_raw {
                row.insert(format!("__{}-protobufs", meta.name), CellValue::Bytes(raw));
            }
        }
        rows.push(row);
    }

    Ok(QueryOutput { headers, types, rows, limit_applied })
}
