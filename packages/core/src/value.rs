//! The dynamic value space carried by the Glyphwire wire format.
//!
//! Everything a peer can send or receive is a [`Value`]: scalars, binary
//! blobs, lists, string-keyed maps, and the two tagged tree forms —
//! [`Node`](crate::Node) and [`Extension`](crate::Extension).

use std::collections::BTreeMap;

use crate::node::{Extension, Node};

/// String-keyed, ordered map of values. Used both for node attributes and
/// for map-shaped content.
pub type Map = BTreeMap<String, Value>;

/// A binary payload with an associated media type.
///
/// Blobs are opaque to the tree layer. Their one protocol-level effect:
/// a blob bound as a form argument forces the request to use chunked
/// transfer (see [`Form::bind`](crate::Form::bind) and the client's
/// invocation path).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blob {
    data: Vec<u8>,
    content_type: String,
}

impl Blob {
    /// Wrap raw bytes with an explicit media type.
    pub fn new(data: impl Into<Vec<u8>>, content_type: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            content_type: content_type.into(),
        }
    }

    /// Wrap raw bytes as `application/octet-stream`.
    pub fn octet_stream(data: impl Into<Vec<u8>>) -> Self {
        Self::new(data, "application/octet-stream")
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    /// Consume the blob, returning its bytes.
    pub fn into_data(self) -> Vec<u8> {
        self.data
    }
}

/// A decoded Glyphwire value.
///
/// `Node` and `Extension` are deliberately distinct variants: an extension
/// is never equal to a plain node carrying the same name, attributes, and
/// content, because equality between different enum variants is always
/// false.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Absent / nothing. Also what a `204 No Content` fetch returns.
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    /// Binary payload. Also what a fetch returns for a non-hypermedia body.
    Blob(Blob),
    List(Vec<Value>),
    Map(Map),
    /// A tagged node whose name is not registered as an extension.
    Node(Node),
    /// A tagged node with protocol behaviour: form, link, resource, error.
    Extension(Extension),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// The text payload, if this is a `Text` value.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&Map> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_blob(&self) -> Option<&Blob> {
        match self {
            Value::Blob(b) => Some(b),
            _ => None,
        }
    }

    /// The extension, if this value is one.
    pub fn as_extension(&self) -> Option<&Extension> {
        match self {
            Value::Extension(e) => Some(e),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<Blob> for Value {
    fn from(v: Blob) -> Self {
        Value::Blob(v)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Value::List(v)
    }
}

impl From<Map> for Value {
    fn from(v: Map) -> Self {
        Value::Map(v)
    }
}

impl From<Node> for Value {
    fn from(v: Node) -> Self {
        Value::Node(v)
    }
}

impl From<Extension> for Value {
    fn from(v: Extension) -> Self {
        Value::Extension(v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blob_preserves_content_type() {
        let b = Blob::new(b"\x00\x01".to_vec(), "image/png");
        assert_eq!(b.content_type(), "image/png");
        assert_eq!(b.data(), b"\x00\x01");
    }

    #[test]
    fn scalar_conversions() {
        assert_eq!(Value::from(3i64), Value::Int(3));
        assert_eq!(Value::from("hi"), Value::Text("hi".into()));
        assert!(Value::Null.is_null());
        assert_eq!(Value::from(true), Value::Bool(true));
    }
}
