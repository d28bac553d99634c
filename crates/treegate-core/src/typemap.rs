//! Type-directed cell decoding.
//!
//! The engine reports a declared type name per column; values arrive as the
//! raw textual bytes of the wire protocol. This module turns a declared type
//! plus raw bytes into a JSON-safe [`CellValue`], probing text columns for
//! embedded tree payloads (the engine does not pre-declare which columns
//! carry trees, so every text value gets a decode-or-fallback attempt).

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use log::debug;
use thiserror::Error;

use crate::uast::{self, Probe};
use crate::value::CellValue;

/// A scan failure is fatal to the whole request: the engine declared a type
/// its own value does not satisfy, which is an internal inconsistency rather
/// than a caller mistake.
#[derive(Debug, Error)]
#[error("column {column}: cannot decode {declared} value: {detail}")]
pub struct ScanError {
    pub column: String,
    pub declared: String,
    pub detail: String,
}

/// Decoded cell plus, for tree-valued cells, the original raw payload bytes
/// destined for the `__<column>-protobufs` sidecar.
#[derive(Debug)]
pub struct DecodedCell {
    pub value: CellValue,
    pub tree_raw: Option<Vec<u8>>,
}

impl DecodedCell {
    fn plain(value: CellValue) -> Self {
        DecodedCell { value, tree_raw: None }
    }
}

/// Decodes one cell according to the declared column type.
///
/// SQL NULL always yields `CellValue::Null` so the output key still exists
/// in the row mapping. Type keywords are matched case-sensitively, exactly
/// as the engine reports them.
pub fn decode_cell(
    column: &str,
    declared: &str,
    raw: Option<&[u8]>,
) -> Result<DecodedCell, ScanError> {
    let Some(bytes) = raw else {
        return Ok(DecodedCell::plain(CellValue::Null));
    };

    let scan_err = |detail: String| ScanError {
        column: column.to_string(),
        declared: declared.to_string(),
        detail,
    };

    let value = match declared {
        "BIT" => CellValue::Bool(bytes.iter().any(|b| *b != 0)),
        "TIMESTAMP" | "DATE" | "DATETIME" => {
            let text = std::str::from_utf8(bytes).map_err(|e| scan_err(e.to_string()))?;
            CellValue::Timestamp(parse_timestamp(text).ok_or_else(|| {
                scan_err(format!("not a timestamp: {:?}", text))
            })?)
        }
        "INT" | "MEDIUMINT" | "BIGINT" | "SMALLINT" | "TINYINT" => {
            let text = std::str::from_utf8(bytes).map_err(|e| scan_err(e.to_string()))?;
            CellValue::Int(text.trim().parse().map_err(|e| scan_err(format!("{e}: {text:?}")))?)
        }
        "DOUBLE" | "FLOAT" => {
            let text = std::str::from_utf8(bytes).map_err(|e| scan_err(e.to_string()))?;
            CellValue::Float(text.trim().parse().map_err(|e| scan_err(format!("{e}: {text:?}")))?)
        }
        "JSON" => CellValue::Json(
            serde_json::from_slice(bytes).map_err(|e| scan_err(e.to_string()))?,
        ),
        // Text and blob variations. Values may carry an embedded tree
        // payload; decode failures fall back to the plain string.
        _ => {
            if !bytes.is_empty() {
                match uast::probe(bytes) {
                    Probe::Tree(nodes) => {
                        return Ok(DecodedCell {
                            value: CellValue::Tree(nodes),
                            tree_raw: Some(bytes.to_vec()),
                        });
                    }
                    Probe::Malformed(err) => {
                        debug!("column {column}: payload frames like a tree but does not decode: {err}");
                    }
                    Probe::NotTree => {}
                }
            }
            CellValue::Text(String::from_utf8_lossy(bytes).into_owned())
        }
    };

    Ok(DecodedCell::plain(value))
}

fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    let naive = NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S%.f")
        .ok()
        .or_else(|| NaiveDate::parse_from_str(text, "%Y-%m-%d").ok()?.and_hms_opt(0, 0, 0))?;
    Some(DateTime::from_naive_utc_and_offset(naive, Utc))
}
