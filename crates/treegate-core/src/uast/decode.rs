//! Tree payload decoding.
//!
//! Two wire sub-formats exist across engine versions and the protocol
//! version is not negotiated, so both are supported behind one interface:
//!
//! - framed: a stream of `[i32 big-endian length][protobuf Node]` fragments
//! - legacy: a JSON array of base64-encoded protobuf Node blobs
//!
//! A leading `[` (after whitespace) selects the legacy sub-format; a valid
//! framed payload can never start with `[` because that would declare a
//! fragment larger than any realistic input.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use prost::Message as _;
use thiserror::Error;

use super::Node;

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("malformed fragment framing at byte {0}")]
    Framing(usize),
    #[error("fragment does not decode as a tree node: {0}")]
    Proto(#[from] prost::DecodeError),
    #[error("legacy payload is not a JSON array of strings: {0}")]
    LegacyJson(#[from] serde_json::Error),
    #[error("legacy fragment is not valid base64: {0}")]
    LegacyBase64(#[from] base64::DecodeError),
}

/// Outcome of sniffing a text column for a tree payload.
///
/// Only `Tree` promotes the column to a decoded node array; the other two
/// leave the value as plain text. `Malformed` is surfaced separately so the
/// caller can log payloads that framed correctly but failed to parse.
#[derive(Debug)]
pub enum Probe {
    Tree(Vec<Node>),
    NotTree,
    Malformed(DecodeError),
}

/// Strict decode of a tree payload in either sub-format.
///
/// An empty input is an empty tree collection, not an error.
pub fn decode(data: &[u8]) -> Result<Vec<Node>, DecodeError> {
    if data.is_empty() {
        return Ok(Vec::new());
    }
    if first_significant_byte(data) == Some(b'[') {
        decode_legacy(data)
    } else {
        decode_framed(data)
    }
}

/// Opportunistic decode used by the type mapper on every text column.
pub fn probe(data: &[u8]) -> Probe {
    if data.is_empty() {
        return Probe::NotTree;
    }

    if first_significant_byte(data) == Some(b'[') {
        // Plain text frequently starts with '[' (JSON arrays, log lines), so
        // any legacy-format failure means "not a tree" rather than damage.
        return match decode_legacy(data) {
            Ok(nodes) if !nodes.is_empty() => Probe::Tree(nodes),
            _ => Probe::NotTree,
        };
    }

    if !looks_framed(data) {
        return Probe::NotTree;
    }
    match decode_framed(data) {
        Ok(nodes) => Probe::Tree(nodes),
        Err(err) => Probe::Malformed(err),
    }
}

fn first_significant_byte(data: &[u8]) -> Option<u8> {
    data.iter().copied().find(|b| !b.is_ascii_whitespace())
}

/// Cheap structural check: does the first frame header describe a fragment
/// that fits in the input?
fn looks_framed(data: &[u8]) -> bool {
    if data.len() < 4 {
        return false;
    }
    let len = i32::from_be_bytes([data[0], data[1], data[2], data[3]]);
    len >= 1 && (len as usize) <= data.len() - 4
}

fn decode_framed(data: &[u8]) -> Result<Vec<Node>, DecodeError> {
    let mut nodes = Vec::new();
    let mut pos = 0usize;

    while pos < data.len() {
        if data.len() - pos < 4 {
            return Err(DecodeError::Framing(pos));
        }
        let len = i32::from_be_bytes([data[pos], data[pos + 1], data[pos + 2], data[pos + 3]]);
        if len < 1 {
            return Err(DecodeError::Framing(pos));
        }
        pos += 4;

        let len = len as usize;
        if data.len() - pos < len {
            return Err(DecodeError::Framing(pos));
        }
        nodes.push(Node::decode(&data[pos..pos + len])?);
        pos += len;
    }

    Ok(nodes)
}

fn decode_legacy(data: &[u8]) -> Result<Vec<Node>, DecodeError> {
    let blobs: Vec<String> = serde_json::from_slice(data)?;

    let mut nodes = Vec::with_capacity(blobs.len());
    for blob in &blobs {
        let raw = BASE64.decode(blob.as_bytes())?;
        nodes.push(Node::decode(raw.as_slice())?);
    }
    Ok(nodes)
}

#[cfg(test)]
mod tests {
    use super::super::{Position, Role};
    use super::*;

    fn sample_node(internal_type: &str) -> Node {
        Node {
            internal_type: internal_type.to_string(),
            token: "x".to_string(),
            roles: vec![Role::Identifier as i32, Role::Expression as i32],
            start_position: Some(Position { offset: 0, line: 1, col: 1 }),
            end_position: Some(Position { offset: 1, line: 1, col: 2 }),
            ..Default::default()
        }
    }

    fn frame(nodes: &[Node]) -> Vec<u8> {
        let mut out = Vec::new();
        for node in nodes {
            let bytes = node.encode_to_vec();
            out.extend_from_slice(&(bytes.len() as i32).to_be_bytes());
            out.extend_from_slice(&bytes);
        }
        out
    }

    fn legacy(nodes: &[Node]) -> Vec<u8> {
        let blobs: Vec<String> = nodes
            .iter()
            .map(|n| BASE64.encode(n.encode_to_vec()))
            .collect();
        serde_json::to_vec(&blobs).unwrap()
    }

    #[test]
    fn framed_fragment_count_matches_input() {
        let nodes = vec![sample_node("Ident"), sample_node("Call"), sample_node("Block")];
        let decoded = decode(&frame(&nodes)).unwrap();
        assert_eq!(decoded, nodes);
    }

    #[test]
    fn legacy_fragment_count_matches_input() {
        let nodes = vec![sample_node("Ident"), sample_node("Call")];
        let decoded = decode(&legacy(&nodes)).unwrap();
        assert_eq!(decoded, nodes);
    }

    #[test]
    fn empty_payload_is_an_empty_collection() {
        assert_eq!(decode(&[]).unwrap(), Vec::new());
    }

    #[test]
    fn nested_children_survive_both_formats() {
        let mut parent = sample_node("File");
        parent.children = vec![sample_node("Ident"), sample_node("Call")];
        let nodes = vec![parent];

        assert_eq!(decode(&frame(&nodes)).unwrap(), nodes);
        assert_eq!(decode(&legacy(&nodes)).unwrap(), nodes);
    }

    #[test]
    fn probe_rejects_plain_text() {
        assert!(matches!(probe(b"README contents"), Probe::NotTree));
        assert!(matches!(probe(b"hi"), Probe::NotTree));
        assert!(matches!(probe(b""), Probe::NotTree));
    }

    #[test]
    fn probe_rejects_ordinary_json_arrays() {
        assert!(matches!(probe(b"[]"), Probe::NotTree));
        assert!(matches!(probe(br#"["alpha","beta"]"#), Probe::NotTree));
        assert!(matches!(probe(br#"[1, 2, 3]"#), Probe::NotTree));
    }

    #[test]
    fn probe_accepts_framed_payload() {
        let nodes = vec![sample_node("Ident")];
        match probe(&frame(&nodes)) {
            Probe::Tree(decoded) => assert_eq!(decoded, nodes),
            other => panic!("expected tree, got {:?}", other),
        }
    }

    #[test]
    fn probe_flags_truncated_framed_payload_as_malformed() {
        let mut data = frame(&[sample_node("Ident"), sample_node("Call")]);
        data.truncate(data.len() - 3);
        assert!(matches!(probe(&data), Probe::Malformed(_)));
    }

    #[test]
    fn zero_length_frame_is_rejected() {
        let data = 0i32.to_be_bytes().to_vec();
        assert!(matches!(decode(&data), Err(DecodeError::Framing(0))));
    }
}
