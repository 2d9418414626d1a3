//! Baseline JSON rendering of the Glyphwire tree encoding.
//!
//! Scalars, lists, and maps use their native JSON forms. The three shapes
//! JSON cannot carry directly use single-key marker objects:
//!
//! | Shape | Wire form |
//! |-------|-----------|
//! | blob | `{"$blob": {"content_type": "...", "data": "<base64>"}}` |
//! | plain node | `{"$node": {"name", "attributes", "content"}}` |
//! | extension | `{"$ext": {"name", "attributes", "content"}}` |
//!
//! Marker keys are reserved: a plain map whose single key is one of them
//! is rejected at encode time, so decoding is unambiguous.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde_json::Value as Json;

use crate::codec::{Codec, CodecError};
use crate::node::Node;
use crate::registry::Registry;
use crate::resolve::Resolver;
use crate::value::{Blob, Map, Value};

/// The media type negotiated for JSON-encoded trees.
pub const CONTENT_TYPE: &str = "application/vnd.glyphwire+json";

const BLOB_KEY: &str = "$blob";
const NODE_KEY: &str = "$node";
const EXT_KEY: &str = "$ext";

/// The baseline JSON codec.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn content_type(&self) -> &str {
        CONTENT_TYPE
    }

    fn dump(&self, value: &Value) -> Result<Vec<u8>, CodecError> {
        let json = encode(value)?;
        Ok(serde_json::to_vec(&json)?)
    }

    fn parse(
        &self,
        bytes: &[u8],
        registry: &Registry,
        resolver: &Resolver,
    ) -> Result<Value, CodecError> {
        let json: Json = serde_json::from_slice(bytes)?;
        decode(&json, registry, resolver)
    }
}

// ---------------------------------------------------------------------------
// Encoding
// ---------------------------------------------------------------------------

fn encode(value: &Value) -> Result<Json, CodecError> {
    Ok(match value {
        Value::Null => Json::Null,
        Value::Bool(b) => Json::Bool(*b),
        Value::Int(i) => Json::from(*i),
        Value::Float(f) => serde_json::Number::from_f64(*f)
            .map(Json::Number)
            .ok_or_else(|| CodecError::Unencodable(format!("non-finite float {f}")))?,
        Value::Text(s) => Json::String(s.clone()),
        Value::Blob(blob) => encode_blob(blob),
        Value::List(items) => Json::Array(
            items
                .iter()
                .map(encode)
                .collect::<Result<Vec<_>, _>>()?,
        ),
        Value::Map(map) => encode_map(map)?,
        Value::Node(node) => marker(NODE_KEY, encode_triple(node)?),
        Value::Extension(ext) => marker(EXT_KEY, encode_triple(ext.node())?),
    })
}

fn encode_blob(blob: &Blob) -> Json {
    let mut body = serde_json::Map::new();
    body.insert(
        "content_type".into(),
        Json::String(blob.content_type().to_string()),
    );
    body.insert("data".into(), Json::String(BASE64.encode(blob.data())));
    marker(BLOB_KEY, Json::Object(body))
}

fn encode_map(map: &Map) -> Result<Json, CodecError> {
    if map.len() == 1 {
        if let Some(key) = map.keys().next() {
            if key == BLOB_KEY || key == NODE_KEY || key == EXT_KEY {
                return Err(CodecError::Unencodable(format!(
                    "map key {key:?} is reserved for the wire encoding"
                )));
            }
        }
    }
    let mut object = serde_json::Map::new();
    for (key, value) in map {
        object.insert(key.clone(), encode(value)?);
    }
    Ok(Json::Object(object))
}

fn encode_triple(node: &Node) -> Result<Json, CodecError> {
    let mut attributes = serde_json::Map::new();
    for (key, value) in node.attributes() {
        attributes.insert(key.clone(), encode(value)?);
    }
    let mut triple = serde_json::Map::new();
    triple.insert("name".into(), Json::String(node.name().to_string()));
    triple.insert("attributes".into(), Json::Object(attributes));
    triple.insert("content".into(), encode(node.content())?);
    Ok(Json::Object(triple))
}

fn marker(key: &str, body: Json) -> Json {
    let mut object = serde_json::Map::new();
    object.insert(key.to_string(), body);
    Json::Object(object)
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

fn decode(json: &Json, registry: &Registry, resolver: &Resolver) -> Result<Value, CodecError> {
    Ok(match json {
        Json::Null => Value::Null,
        Json::Bool(b) => Value::Bool(*b),
        Json::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Int(i)
            } else if let Some(f) = n.as_f64() {
                Value::Float(f)
            } else {
                return Err(CodecError::Malformed(format!("unrepresentable number {n}")));
            }
        }
        Json::String(s) => Value::Text(s.clone()),
        Json::Array(items) => Value::List(
            items
                .iter()
                .map(|item| decode(item, registry, resolver))
                .collect::<Result<Vec<_>, _>>()?,
        ),
        Json::Object(object) => {
            if object.len() == 1 {
                if let Some(body) = object.get(BLOB_KEY) {
                    return decode_blob(body);
                }
                if let Some(body) = object.get(NODE_KEY) {
                    let (name, attributes, content) =
                        decode_triple(body, registry, resolver)?;
                    return Ok(Value::Node(Node::new(name, attributes, content)));
                }
                if let Some(body) = object.get(EXT_KEY) {
                    let (name, attributes, content) =
                        decode_triple(body, registry, resolver)?;
                    let mut made = registry.make(name, attributes, content);
                    if let Value::Extension(ext) = &mut made {
                        ext.resolve(resolver)?;
                    }
                    return Ok(made);
                }
            }
            let mut map = Map::new();
            for (key, value) in object {
                map.insert(key.clone(), decode(value, registry, resolver)?);
            }
            Value::Map(map)
        }
    })
}

fn decode_blob(body: &Json) -> Result<Value, CodecError> {
    let object = body
        .as_object()
        .ok_or_else(|| CodecError::Malformed("$blob body must be an object".into()))?;
    let content_type = object
        .get("content_type")
        .and_then(Json::as_str)
        .unwrap_or("application/octet-stream");
    let data = object
        .get("data")
        .and_then(Json::as_str)
        .ok_or_else(|| CodecError::Malformed("$blob is missing its data field".into()))?;
    let bytes = BASE64
        .decode(data)
        .map_err(|e| CodecError::Malformed(format!("$blob data is not valid base64: {e}")))?;
    Ok(Value::Blob(Blob::new(bytes, content_type)))
}

/// Decode a `(name, attributes, content)` triple bottom-up: attributes and
/// content are fully decoded (and any nested extensions resolved) before
/// the triple itself is constructed.
fn decode_triple(
    body: &Json,
    registry: &Registry,
    resolver: &Resolver,
) -> Result<(String, Map, Value), CodecError> {
    let object = body
        .as_object()
        .ok_or_else(|| CodecError::Malformed("node body must be an object".into()))?;
    let name = object
        .get("name")
        .and_then(Json::as_str)
        .ok_or_else(|| CodecError::Malformed("node is missing its name".into()))?
        .to_string();
    let mut attributes = Map::new();
    if let Some(raw) = object.get("attributes") {
        let raw = raw
            .as_object()
            .ok_or_else(|| CodecError::Malformed("node attributes must be an object".into()))?;
        for (key, value) in raw {
            attributes.insert(key.clone(), decode(value, registry, resolver)?);
        }
    }
    let content = match object.get("content") {
        Some(raw) => decode(raw, registry, resolver)?,
        None => Value::Null,
    };
    Ok((name, attributes, content))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build;
    use crate::node::{Extension, Link};

    fn parse(codec: &JsonCodec, bytes: &[u8], base: &str) -> Value {
        let registry = Registry::with_builtins();
        let resolver = Resolver::new(base).unwrap();
        codec.parse(bytes, &registry, &resolver).unwrap()
    }

    #[test]
    fn nested_tree_roundtrips() {
        let mut content = Map::new();
        content.insert("next".into(), build::link("http://host/base/x"));
        content.insert(
            "payload".into(),
            Value::Blob(Blob::new(b"\x00\xffbytes".to_vec(), "application/octet-stream")),
        );
        let tree = build::node("report", Map::new(), Value::Map(content));

        let codec = JsonCodec;
        let bytes = codec.dump(&tree).unwrap();
        let back = parse(&codec, &bytes, "http://host/base/");
        assert_eq!(back, tree);
    }

    #[test]
    fn decoded_link_resolves_against_base() {
        let codec = JsonCodec;
        let bytes = codec
            .dump(&Value::Extension(Extension::Link(Link::new("x"))))
            .unwrap();
        let back = parse(&codec, &bytes, "http://host/base/");
        match back {
            Value::Extension(Extension::Link(l)) => {
                assert_eq!(l.url(), Some("http://host/base/x"));
            }
            other => panic!("expected link, got {other:?}"),
        }
    }

    #[test]
    fn nested_extensions_resolve_at_any_depth() {
        let mut inner = Map::new();
        inner.insert("deep".into(), build::link("y"));
        let tree = Value::List(vec![Value::Map(inner)]);

        let codec = JsonCodec;
        let bytes = codec.dump(&tree).unwrap();
        let back = parse(&codec, &bytes, "http://host/base/");

        let Value::List(items) = back else {
            panic!("expected list");
        };
        let Value::Map(map) = &items[0] else {
            panic!("expected map");
        };
        match map.get("deep") {
            Some(Value::Extension(Extension::Link(l))) => {
                assert_eq!(l.url(), Some("http://host/base/y"));
            }
            other => panic!("expected link, got {other:?}"),
        }
    }

    #[test]
    fn unregistered_ext_tag_decodes_to_plain_node() {
        let codec = JsonCodec;
        let wire = br#"{"$ext": {"name": "mystery", "attributes": {}, "content": 3}}"#;
        let back = parse(&codec, wire, "http://host/");
        match back {
            Value::Node(node) => {
                assert_eq!(node.name(), "mystery");
                assert_eq!(node.content(), &Value::Int(3));
            }
            other => panic!("expected plain node, got {other:?}"),
        }
    }

    #[test]
    fn reserved_single_key_map_is_rejected_on_dump() {
        let mut map = Map::new();
        map.insert("$node".into(), Value::Int(1));
        let err = JsonCodec.dump(&Value::Map(map)).unwrap_err();
        assert!(matches!(err, CodecError::Unencodable(_)));
    }

    #[test]
    fn bad_base64_blob_is_malformed() {
        let codec = JsonCodec;
        let registry = Registry::with_builtins();
        let resolver = Resolver::new("http://host/").unwrap();
        let wire = br#"{"$blob": {"content_type": "text/plain", "data": "!!not-base64!!"}}"#;
        let err = codec.parse(wire, &registry, &resolver).unwrap_err();
        assert!(matches!(err, CodecError::Malformed(_)));
    }

    #[test]
    fn numbers_decode_by_shape() {
        let codec = JsonCodec;
        let back = parse(&codec, b"[1, 2.5]", "http://host/");
        assert_eq!(back, Value::List(vec![Value::Int(1), Value::Float(2.5)]));
    }

    #[test]
    fn dump_iter_chunks_cover_the_full_payload() {
        let codec = JsonCodec;
        let tree = build::node("n", Map::new(), Value::Text("x".repeat(100)));
        let whole = codec.dump(&tree).unwrap();
        let chunks: Vec<Vec<u8>> = codec.dump_iter(&tree, 16).unwrap().collect();
        assert!(chunks.len() > 1);
        assert!(chunks.iter().all(|c| c.len() <= 16));
        assert_eq!(chunks.concat(), whole);
    }
}
