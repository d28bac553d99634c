//! `POST /export` — forward a SQL statement and return the rows as CSV.

use actix_web::http::header;
use actix_web::{web, HttpResponse};
use futures_util::stream;
use log::debug;

use treegate_core::engine::Engine;
use treegate_core::value::{CellValue, Row};

use super::{error_response, run_query, validate, AppState};
use crate::models::QueryRequest;

/// Handler for `POST /export`.
///
/// Same query semantics as `/query`, but the response is a `text/csv`
/// attachment: a header row of column names, then one record per row, with
/// tree columns rendered as their decoded JSON form and NULL cells as empty
/// fields. The executor materializes the full result set before the
/// response starts (the row cap bounds its size); only the CSV encoding is
/// chunked, one record per chunk. Errors are only translatable into the
/// JSON envelope before the first byte goes out.
pub async fn export<E: Engine>(
    body: web::Json<QueryRequest>,
    state: web::Data<AppState<E>>,
) -> HttpResponse {
    let request = body.into_inner();
    if let Err(response) = validate(&request) {
        return response;
    }

    debug!("received export query: {}", request.query);

    let output = match run_query(&state, request.query, request.limit).await {
        Ok(output) => output,
        Err(err) => return error_response(err),
    };

    let headers = output.headers;
    let header_record = headers.clone();
    let records = std::iter::once(encode_record(header_record.into_iter()))
        .chain(output.rows.into_iter().map(move |row| encode_row(&headers, row)));

    HttpResponse::Ok()
        .insert_header((header::CONTENT_TYPE, "text/csv"))
        .insert_header((header::CONTENT_DISPOSITION, "attachment; filename=export.csv"))
        .streaming(stream::iter(records))
}

fn encode_row(headers: &[String], row: Row) -> Result<web::Bytes, actix_web::Error> {
    let mut fields = Vec::with_capacity(headers.len());
    for name in headers {
        // Sidecar entries are not columns; only header-listed keys export.
        let value = row.get(name).unwrap_or(&CellValue::Null);
        fields.push(
            value
                .to_csv_field()
                .map_err(actix_web::error::ErrorInternalServerError)?,
        );
    }
    encode_record(fields.into_iter())
}

fn encode_record(
    fields: impl Iterator<Item = String>,
) -> Result<web::Bytes, actix_web::Error> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer
        .write_record(fields)
        .map_err(actix_web::error::ErrorInternalServerError)?;
    let buf = writer
        .into_inner()
        .map_err(actix_web::error::ErrorInternalServerError)?;
    Ok(web::Bytes::from(buf))
}
