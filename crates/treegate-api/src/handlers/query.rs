//! `POST /query` — forward a SQL statement and return the rows as JSON.

use actix_web::{web, HttpResponse};
use log::debug;

use treegate_core::engine::Engine;

use super::{error_response, run_query, validate, AppState};
use crate::models::{Envelope, QueryRequest};

/// Handler for `POST /query`.
///
/// Accepts `{ "query": "SQL statement", "limit": 1234 }`; `limit` is
/// optional and zero disables capping. SELECT statements get the cap
/// injected as a trailing `LIMIT`; the response `meta` echoes the cap when
/// it was applied.
pub async fn query<E: Engine>(
    body: web::Json<QueryRequest>,
    state: web::Data<AppState<E>>,
) -> HttpResponse {
    let request = body.into_inner();
    if let Err(response) = validate(&request) {
        return response;
    }

    debug!("received query: {}", request.query);

    let output = match run_query(&state, request.query, request.limit).await {
        Ok(output) => output,
        Err(err) => return error_response(err),
    };

    let limit = output.limit_applied.then_some(request.limit);
    match Envelope::query(&output.rows, output.headers, output.types, limit) {
        Ok(envelope) => envelope.into_response(),
        Err(err) => error_response(treegate_core::exec::QueryError::Internal(format!(
            "failed to serialize result rows: {err}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes;
    use actix_web::http::StatusCode;
    use actix_web::{test, App};
    use serde_json::{json, Value as JsonValue};
    use std::sync::Arc;
    use treegate_core::engine::{ColumnMeta, EngineError, ResultSet};
    use treegate_core::exec::QueryExecutor;
    use treegate_core::testkit::{columns, text_row, MockEngine};

    fn app_state(engine: MockEngine) -> web::Data<AppState<MockEngine>> {
        web::Data::new(AppState {
            executor: Arc::new(QueryExecutor::new(Arc::new(engine))),
        })
    }

    async fn post_query(
        state: web::Data<AppState<MockEngine>>,
        body: JsonValue,
    ) -> (StatusCode, JsonValue) {
        let app = test::init_service(
            App::new()
                .app_data(state)
                .configure(routes::configure::<MockEngine>),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/query")
            .set_json(body)
            .to_request();
        let resp = test::call_service(&app, req).await;
        let status = resp.status();
        let body: JsonValue = test::read_body_json(resp).await;
        (status, body)
    }

    #[actix_web::test]
    async fn success_returns_rows_with_column_meta() {
        let engine = MockEngine::with_result(ResultSet {
            columns: columns(&[("ref_name", "TEXT"), ("n", "BIGINT")]),
            rows: vec![text_row(&[Some("HEAD"), Some("7")])],
        });
        let (status, body) = post_query(
            app_state(engine),
            json!({"query": "select * from refs", "limit": 100}),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], 200);
        assert_eq!(body["data"][0]["ref_name"], "HEAD");
        assert_eq!(body["data"][0]["n"], 7);
        assert_eq!(body["meta"]["headers"], json!(["ref_name", "n"]));
        assert_eq!(body["meta"]["types"], json!(["TEXT", "BIGINT"]));
        assert_eq!(body["meta"]["limit"], 100);
    }

    #[actix_web::test]
    async fn null_cells_keep_their_keys() {
        let engine = MockEngine::with_result(ResultSet {
            columns: columns(&[("name", "TEXT")]),
            rows: vec![text_row(&[None])],
        });
        let (_, body) = post_query(app_state(engine), json!({"query": "select name from t"})).await;

        let row = body["data"][0].as_object().unwrap();
        assert!(row.contains_key("name"));
        assert!(row["name"].is_null());
    }

    #[actix_web::test]
    async fn empty_query_is_a_bad_request() {
        let engine = MockEngine::with_result(ResultSet::default());
        let (status, body) = post_query(app_state(engine), json!({"query": "  "})).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["errors"][0]["status"], 400);
    }

    #[actix_web::test]
    async fn wrong_typed_limit_gets_the_error_envelope() {
        // The JsonConfig error handler translates deserialization failures,
        // so a string limit never reaches the handler as a zero default.
        let engine = MockEngine::with_result(ResultSet::default());
        let app = test::init_service(
            App::new()
                .app_data(
                    web::JsonConfig::default()
                        .error_handler(crate::models::json_error_handler),
                )
                .app_data(app_state(engine))
                .configure(routes::configure::<MockEngine>),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/query")
            .set_json(json!({"query": "select 1", "limit": "abc"}))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let body: JsonValue = test::read_body_json(resp).await;
        assert_eq!(body["errors"][0]["status"], 400);
    }

    #[actix_web::test]
    async fn negative_limit_is_a_bad_request() {
        let engine = MockEngine::with_result(ResultSet::default());
        let (status, _) = post_query(
            app_state(engine),
            json!({"query": "select 1", "limit": -1}),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn engine_errors_surface_with_their_native_code() {
        let engine = MockEngine::failing(EngineError::Sql {
            code: 1105,
            message: "unknown table: foo".to_string(),
        });
        let (status, body) =
            post_query(app_state(engine), json!({"query": "select * from foo"})).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["errors"][0]["mysqlCode"], 1105);
        assert_eq!(body["errors"][0]["title"], "unknown table: foo");
    }

    #[actix_web::test]
    async fn internal_errors_leak_no_detail() {
        let engine = MockEngine::with_result(ResultSet {
            columns: vec![ColumnMeta { name: "n".into(), type_name: "BIGINT".into() }],
            rows: vec![text_row(&[Some("oops")])],
        });
        let (status, body) = post_query(app_state(engine), json!({"query": "select n"})).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["errors"][0]["title"], "Internal Server Error");
    }
}
