//! Construction helpers for assembling outgoing trees.
//!
//! Thin factories over the model, mirroring the decode-side shapes. Use
//! these when composing a request body or a server-side response tree by
//! hand; decoded trees come out of the codec instead.

use crate::node::{ErrorNode, Extension, Form, Link, Node, Resource};
use crate::value::{Map, Value};

/// A plain tagged node.
pub fn node(name: impl Into<String>, attributes: Map, content: Value) -> Value {
    Value::Node(Node::new(name, attributes, content))
}

/// A `POST` form at `url` declaring the given parameter names.
pub fn form<I, S>(url: impl Into<String>, values: I) -> Value
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    Value::Extension(Extension::Form(Form::new(url).with_values(values)))
}

/// A `GET` link to `url`.
pub fn link(url: impl Into<String>) -> Value {
    Value::Extension(Extension::Link(Link::new(url)))
}

/// A link carrying its target's content inline; invoking it is free.
pub fn embedlink(url: impl Into<String>, content: Value) -> Value {
    Value::Extension(Extension::Link(Link::inline(url, content)))
}

/// A peer-reported failure with a correlation id and message.
pub fn error(logref: impl Into<Value>, message: impl Into<String>) -> Value {
    Value::Extension(Extension::Error(ErrorNode::new(logref, message)))
}

/// A remote object of class `name` at `url` with the given contents.
pub fn robj(name: impl Into<String>, url: impl Into<String>, contents: Value) -> Value {
    Value::Extension(Extension::Resource(Resource::new(name, url, contents)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn helpers_build_the_expected_variants() {
        assert!(matches!(
            form("http://h/f", ["a"]),
            Value::Extension(Extension::Form(_))
        ));
        assert!(matches!(
            link("http://h/l"),
            Value::Extension(Extension::Link(_))
        ));
        assert!(matches!(
            error(Value::Int(1), "nope"),
            Value::Extension(Extension::Error(_))
        ));
        assert!(matches!(node("n", Map::new(), Value::Null), Value::Node(_)));
    }

    #[test]
    fn embedlink_is_inline() {
        match embedlink("http://h/e", Value::Int(9)) {
            Value::Extension(Extension::Link(l)) => {
                assert!(l.is_inline());
                assert_eq!(l.content(), &Value::Int(9));
            }
            other => panic!("expected link, got {other:?}"),
        }
    }

    #[test]
    fn robj_carries_class_and_url() {
        match robj("Counter", "http://h/counter/1", Value::Map(Map::new())) {
            Value::Extension(Extension::Resource(r)) => {
                assert_eq!(r.class_name(), Some("Counter"));
                assert_eq!(r.url(), Some("http://h/counter/1"));
            }
            other => panic!("expected resource, got {other:?}"),
        }
    }
}
