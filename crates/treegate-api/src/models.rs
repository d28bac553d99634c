//! Request and response models for the query endpoints.
//!
//! Every JSON response uses one envelope shape: `status` plus either `data`
//! (with optional `meta`) on success, or `errors` on failure — never both.
//!
//! # Example Success Response
//! ```json
//! {
//!   "status": 200,
//!   "data": [ {"ref_name": "HEAD", "commit_count": 3} ],
//!   "meta": { "headers": ["ref_name", "commit_count"], "types": ["TEXT", "BIGINT"] }
//! }
//! ```
//!
//! # Example Error Response
//! ```json
//! {
//!   "status": 400,
//!   "errors": [ { "status": 400, "title": "syntax error", "mysqlCode": 1105 } ]
//! }
//! ```

use actix_web::http::StatusCode;
use actix_web::{error, HttpRequest, HttpResponse};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use treegate_core::value::Row;

/// Body of `POST /query` and `POST /export`.
#[derive(Debug, Clone, Deserialize)]
pub struct QueryRequest {
    /// The SQL statement to forward to the engine.
    pub query: String,
    /// Row cap; omitted or zero disables capping.
    #[serde(default)]
    pub limit: i64,
}

/// Result-set metadata: column names and declared types, parallel and in
/// result-set order, plus the effective cap when the rewriter applied one.
#[derive(Debug, Serialize)]
pub struct QueryMeta {
    pub headers: Vec<String>,
    pub types: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<i64>,
}

/// One structured error in the envelope.
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub status: u16,
    pub title: String,
    /// Native engine error code, when the engine produced the error.
    #[serde(rename = "mysqlCode", skip_serializing_if = "Option::is_none")]
    pub mysql_code: Option<u16>,
}

#[derive(Debug, Serialize)]
pub struct Envelope {
    pub status: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<JsonValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<QueryMeta>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<ApiError>>,
}

impl Envelope {
    /// Success envelope for a materialized result set.
    pub fn query(
        rows: &[Row],
        headers: Vec<String>,
        types: Vec<String>,
        limit: Option<i64>,
    ) -> Result<Self, serde_json::Error> {
        Ok(Envelope {
            status: StatusCode::OK.as_u16(),
            data: Some(serde_json::to_value(rows)?),
            meta: Some(QueryMeta { headers, types, limit }),
            errors: None,
        })
    }

    /// Success envelope for a non-tabular payload.
    pub fn data(value: JsonValue) -> Self {
        Envelope {
            status: StatusCode::OK.as_u16(),
            data: Some(value),
            meta: None,
            errors: None,
        }
    }

    pub fn error(status: StatusCode, title: impl Into<String>) -> Self {
        Envelope {
            status: status.as_u16(),
            data: None,
            meta: None,
            errors: Some(vec![ApiError {
                status: status.as_u16(),
                title: title.into(),
                mysql_code: None,
            }]),
        }
    }

    /// Error envelope carrying the engine's native error code.
    pub fn sql_error(status: StatusCode, code: u16, title: impl Into<String>) -> Self {
        Envelope {
            status: status.as_u16(),
            data: None,
            meta: None,
            errors: Some(vec![ApiError {
                status: status.as_u16(),
                title: title.into(),
                mysql_code: Some(code),
            }]),
        }
    }

    pub fn into_response(self) -> HttpResponse {
        let status =
            StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        HttpResponse::build(status).json(self)
    }
}

/// Maps malformed JSON bodies (wrong types included) onto the structured
/// error envelope instead of actix's plain-text default.
pub fn json_error_handler(err: error::JsonPayloadError, _req: &HttpRequest) -> error::Error {
    let response = Envelope::error(
        StatusCode::BAD_REQUEST,
        r#"Bad Request. Expected body: { "query": "SQL statement", "limit": 1234 }"#,
    )
    .into_response();
    error::InternalError::from_response(err, response).into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use treegate_core::value::CellValue;

    #[test]
    fn success_envelope_carries_data_and_meta_only() {
        let mut row = Row::new();
        row.insert("n".to_string(), CellValue::Int(1));

        let envelope = Envelope::query(
            &[row],
            vec!["n".to_string()],
            vec!["BIGINT".to_string()],
            Some(100),
        )
        .unwrap();

        let json = serde_json::to_value(&envelope).unwrap();
        assert_eq!(json["status"], 200);
        assert_eq!(json["data"][0]["n"], 1);
        assert_eq!(json["meta"]["headers"][0], "n");
        assert_eq!(json["meta"]["limit"], 100);
        assert!(json.get("errors").is_none());
    }

    #[test]
    fn error_envelope_carries_errors_only() {
        let envelope = Envelope::sql_error(StatusCode::BAD_REQUEST, 1105, "syntax error");
        let json = serde_json::to_value(&envelope).unwrap();
        assert_eq!(json["status"], 400);
        assert_eq!(json["errors"][0]["mysqlCode"], 1105);
        assert_eq!(json["errors"][0]["title"], "syntax error");
        assert!(json.get("data").is_none());
        assert!(json.get("meta").is_none());
    }

    #[test]
    fn unapplied_limit_is_omitted_from_meta() {
        let envelope = Envelope::query(&[], vec![], vec![], None).unwrap();
        let json = serde_json::to_value(&envelope).unwrap();
        assert!(json["meta"].get("limit").is_none());
    }
}
