//! Decoded cell values and rows.
//!
//! A row is an ordered mapping from column name to a tagged value: the key
//! is always present, and SQL NULL shows up as the null variant rather than
//! a missing entry. Column order is preserved end to end into the response.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Serialize, Serializer};

use crate::uast::Node;

/// Ordered column-name → value mapping for one result row.
pub type Row = IndexMap<String, CellValue>;

/// JSON-safe decoded value for one cell.
///
/// `Tree` carries decoded UAST nodes; the matching raw payload travels in a
/// sibling `Bytes` cell (the `__<column>-protobufs` sidecar) so a consumer
/// can re-filter the tree without re-querying.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CellValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Timestamp(DateTime<Utc>),
    Json(serde_json::Value),
    Tree(Vec<Node>),
    Bytes(#[serde(serialize_with = "as_base64")] Vec<u8>),
}

fn as_base64<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&BASE64.encode(bytes))
}

impl CellValue {
    /// CSV rendering: NULL becomes an empty field, trees render as their
    /// decoded JSON form, everything else as its plain string form.
    pub fn to_csv_field(&self) -> Result<String, serde_json::Error> {
        Ok(match self {
            CellValue::Null => String::new(),
            CellValue::Bool(b) => b.to_string(),
            CellValue::Int(i) => i.to_string(),
            CellValue::Float(f) => f.to_string(),
            CellValue::Text(s) => s.clone(),
            CellValue::Timestamp(ts) => ts.to_rfc3339(),
            CellValue::Json(v) => match v {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            },
            CellValue::Tree(nodes) => serde_json::to_string(nodes)?,
            CellValue::Bytes(b) => BASE64.encode(b),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn null_serializes_as_json_null() {
        let json = serde_json::to_value(CellValue::Null).unwrap();
        assert!(json.is_null());
    }

    #[test]
    fn scalar_variants_keep_their_json_type() {
        assert_eq!(serde_json::to_value(CellValue::Bool(true)).unwrap(), serde_json::json!(true));
        assert_eq!(serde_json::to_value(CellValue::Int(-7)).unwrap(), serde_json::json!(-7));
        assert_eq!(serde_json::to_value(CellValue::Float(1.5)).unwrap(), serde_json::json!(1.5));
        assert_eq!(
            serde_json::to_value(CellValue::Text("hi".into())).unwrap(),
            serde_json::json!("hi")
        );
    }

    #[test]
    fn timestamps_serialize_as_rfc3339_strings() {
        let ts = Utc.with_ymd_and_hms(2019, 6, 6, 5, 40, 42).unwrap();
        let json = serde_json::to_value(CellValue::Timestamp(ts)).unwrap();
        assert_eq!(json, serde_json::json!("2019-06-06T05:40:42Z"));
    }

    #[test]
    fn bytes_serialize_as_base64() {
        let json = serde_json::to_value(CellValue::Bytes(b"abc".to_vec())).unwrap();
        assert_eq!(json, serde_json::json!("YWJj"));
    }

    #[test]
    fn row_preserves_insertion_order_and_null_keys() {
        let mut row = Row::new();
        row.insert("b".to_string(), CellValue::Int(1));
        row.insert("a".to_string(), CellValue::Null);

        let json = serde_json::to_string(&row).unwrap();
        assert_eq!(json, r#"{"b":1,"a":null}"#);
    }

    #[test]
    fn csv_fields_render_per_contract() {
        assert_eq!(CellValue::Null.to_csv_field().unwrap(), "");
        assert_eq!(CellValue::Bool(false).to_csv_field().unwrap(), "false");
        assert_eq!(CellValue::Int(42).to_csv_field().unwrap(), "42");
        assert_eq!(CellValue::Text("plain".into()).to_csv_field().unwrap(), "plain");
        assert_eq!(
            CellValue::Json(serde_json::json!({"k": 1})).to_csv_field().unwrap(),
            r#"{"k":1}"#
        );
    }
}
