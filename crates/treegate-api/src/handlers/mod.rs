//! HTTP handlers for the gateway endpoints.

mod export;
mod query;

pub use export::export;
pub use query::query;

use std::sync::Arc;

use actix_web::http::StatusCode;
use actix_web::HttpResponse;
use log::error;
use tokio_util::sync::CancellationToken;

use treegate_core::engine::Engine;
use treegate_core::exec::{QueryError, QueryExecutor, QueryOutput};

use crate::models::{Envelope, QueryRequest};

/// Shared application state for the query endpoints.
pub struct AppState<E: Engine> {
    pub executor: Arc<QueryExecutor<E>>,
}

/// Rejects requests that must not reach the connection pool: an empty
/// statement or a negative limit.
fn validate(req: &QueryRequest) -> Result<(), HttpResponse> {
    if req.query.trim().is_empty() || req.limit < 0 {
        return Err(Envelope::error(
            StatusCode::BAD_REQUEST,
            r#"Bad Request. Expected body: { "query": "SQL statement", "limit": 1234 }"#,
        )
        .into_response());
    }
    Ok(())
}

/// Runs the executor on a detached task tied to the request through a
/// cancellation token. If the client disconnects, actix drops the handler
/// future; the drop guard then fires the token and the detached task lives
/// on just long enough to kill the backend statement.
async fn run_query<E: Engine>(
    state: &AppState<E>,
    statement: String,
    limit: i64,
) -> Result<QueryOutput, QueryError> {
    let token = CancellationToken::new();
    let _abort_on_drop = token.clone().drop_guard();

    let executor = state.executor.clone();
    let task =
        tokio::spawn(async move { executor.execute(&token, &statement, limit).await });

    match task.await {
        Ok(result) => result,
        Err(err) => Err(QueryError::Internal(format!("query task failed: {err}"))),
    }
}

/// Translates executor errors into the error envelope: SQL errors keep the
/// engine's native code and stay 4xx, internal detail is logged but never
/// surfaced.
fn error_response(err: QueryError) -> HttpResponse {
    match err {
        QueryError::Cancelled => {
            Envelope::error(StatusCode::INTERNAL_SERVER_ERROR, "query cancelled by the client")
        }
        QueryError::Sql { code, message } => {
            Envelope::sql_error(StatusCode::BAD_REQUEST, code, message)
        }
        QueryError::Internal(detail) => {
            error!("internal error executing query: {detail}");
            Envelope::error(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
        }
    }
    .into_response()
}
