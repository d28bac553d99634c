//! UAST tree payload types.
//!
//! The engine embeds serialized syntax trees inside text/blob columns. Each
//! fragment is a protobuf-encoded [`Node`]; the message layout matches the
//! encoding the engine emits, so the structs carry prost field tags directly
//! instead of going through a build script.
//!
//! JSON output keeps the historical field names (`InternalType`,
//! `StartPosition`, ...) that downstream consumers already parse, with roles
//! rendered as their string labels and children nested recursively.

mod decode;

pub use decode::{decode, probe, DecodeError, Probe};

use std::collections::HashMap;

use serde::ser::{Serialize, SerializeStruct, Serializer};

/// One node of the decoded tree: a type tag, named string properties, role
/// labels, an ordered list of children, and a source-position span.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Node {
    #[prost(string, tag = "1")]
    pub internal_type: String,
    #[prost(map = "string, string", tag = "2")]
    pub properties: HashMap<String, String>,
    #[prost(message, repeated, tag = "3")]
    pub children: Vec<Node>,
    #[prost(string, tag = "4")]
    pub token: String,
    #[prost(message, optional, tag = "5")]
    pub start_position: Option<Position>,
    #[prost(message, optional, tag = "6")]
    pub end_position: Option<Position>,
    #[prost(enumeration = "Role", repeated, tag = "7")]
    pub roles: Vec<i32>,
}

/// Byte offset plus 1-based line/column of a node boundary.
#[derive(Clone, Copy, PartialEq, ::prost::Message)]
pub struct Position {
    #[prost(uint32, tag = "1")]
    pub offset: u32,
    #[prost(uint32, tag = "2")]
    pub line: u32,
    #[prost(uint32, tag = "3")]
    pub col: u32,
}

/// Semantic role labels attached to tree nodes.
///
/// The numbering mirrors the engine's role registry; ids the gateway does
/// not know about survive decoding and render as `Role(<n>)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum Role {
    Invalid = 0,
    Identifier = 1,
    Qualified = 2,
    Operator = 3,
    Binary = 4,
    Unary = 5,
    Left = 6,
    Right = 7,
    Infix = 8,
    Postfix = 9,
    Bitwise = 10,
    Boolean = 11,
    Unsigned = 12,
    LeftShift = 13,
    RightShift = 14,
    Or = 15,
    Xor = 16,
    And = 17,
    Incomplete = 18,
    Unexpected = 19,
    Modulo = 20,
    Add = 21,
    Substract = 22,
    Multiply = 23,
    Divide = 24,
    Equal = 25,
    Not = 26,
    LessThan = 27,
    LessThanOrEqual = 28,
    GreaterThan = 29,
    GreaterThanOrEqual = 30,
    Identical = 31,
    Contains = 32,
    Increment = 33,
    Decrement = 34,
    Negative = 35,
    Positive = 36,
    Dereference = 37,
    TakeAddress = 38,
    Assignment = 39,
    This = 40,
    Statement = 41,
    Expression = 42,
    Type = 43,
    File = 44,
    Module = 45,
    Function = 46,
    Declaration = 47,
    Name = 48,
    Value = 49,
    String = 50,
    Number = 51,
    Comment = 52,
    Documentation = 53,
    Whitespace = 54,
    If = 55,
    Condition = 56,
    Then = 57,
    Else = 58,
    Switch = 59,
    Case = 60,
    Default = 61,
    For = 62,
    Iterator = 63,
    While = 64,
    DoWhile = 65,
    Break = 66,
    Continue = 67,
    Goto = 68,
    Block = 69,
    Scope = 70,
    Return = 71,
    Throw = 72,
    Try = 73,
    Catch = 74,
    Finally = 75,
    Call = 76,
    Argument = 77,
    Callee = 78,
    Import = 79,
    Alias = 80,
    Pathname = 81,
    Noop = 82,
    Literal = 83,
    Byte = 84,
    ByteString = 85,
    Character = 86,
    List = 87,
    Map = 88,
    Null = 89,
    Regexp = 90,
    Set = 91,
    Tuple = 92,
    Anonymous = 93,
    Class = 94,
    Interface = 95,
    Package = 96,
    Instance = 97,
    Visibility = 98,
    Annotation = 99,
    Assert = 100,
    Body = 101,
    Enumeration = 102,
    Arithmetic = 103,
    Relational = 104,
    Variable = 105,
    Arg = 106,
    Receiver = 107,
}

/// String label for a decoded role id. Ids outside the known registry are
/// preserved rather than dropped.
pub fn role_name(id: i32) -> String {
    match Role::try_from(id) {
        Ok(role) => format!("{:?}", role),
        Err(_) => format!("Role({})", id),
    }
}

impl Serialize for Node {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let roles: Vec<String> = self.roles.iter().map(|r| role_name(*r)).collect();

        let mut node = serializer.serialize_struct("Node", 7)?;
        node.serialize_field("InternalType", &self.internal_type)?;
        node.serialize_field("Properties", &self.properties)?;
        node.serialize_field("Token", &self.token)?;
        node.serialize_field("StartPosition", &self.start_position)?;
        node.serialize_field("EndPosition", &self.end_position)?;
        node.serialize_field("Roles", &roles)?;
        node.serialize_field("Children", &self.children)?;
        node.end()
    }
}

impl Serialize for Position {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut pos = serializer.serialize_struct("Position", 3)?;
        pos.serialize_field("Offset", &self.offset)?;
        pos.serialize_field("Line", &self.line)?;
        pos.serialize_field("Col", &self.col)?;
        pos.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_names_round_trip_known_and_unknown_ids() {
        assert_eq!(role_name(Role::Identifier as i32), "Identifier");
        assert_eq!(role_name(Role::Function as i32), "Function");
        assert_eq!(role_name(9999), "Role(9999)");
    }

    #[test]
    fn node_serializes_with_historical_field_names() {
        let node = Node {
            internal_type: "CompilationUnit".to_string(),
            roles: vec![Role::File as i32],
            start_position: Some(Position { offset: 0, line: 1, col: 1 }),
            ..Default::default()
        };

        let json = serde_json::to_value(&node).unwrap();
        assert_eq!(json["InternalType"], "CompilationUnit");
        assert_eq!(json["Roles"][0], "File");
        assert_eq!(json["StartPosition"]["Line"], 1);
        assert!(json["EndPosition"].is_null());
        assert_eq!(json["Children"], serde_json::json!([]));
    }
}
