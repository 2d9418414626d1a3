//! Tag-name → extension-constructor dispatch.
//!
//! The registry is the sole polymorphism mechanism of the tree layer:
//! decoders hand every extension-marked node to [`Registry::make`] and get
//! back either a concrete [`Extension`] (for registered names) or a plain
//! [`Node`] fallback. Nothing else branches on variant names.
//!
//! A registry is an explicitly constructed value, passed by reference into
//! the decoder — there is no process-wide mutable state. Registration
//! happens in a setup phase (`&mut self`); decoding only reads (`&self`),
//! so the borrow checker rules out concurrent mutation.

use std::collections::HashMap;

use crate::node::{ErrorNode, Extension, Form, Link, Node, Resource};
use crate::value::{Map, Value};

/// Builds one extension variant from a decoded `(name, attributes,
/// content)` triple. The tag name is passed through so an alias
/// registration keeps the name it was decoded under.
pub type Constructor = fn(String, Map, Value) -> Extension;

/// Maps tag names to extension constructors.
#[derive(Debug, Clone)]
pub struct Registry {
    constructors: HashMap<String, Constructor>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl Registry {
    /// A registry with no entries: every tag decodes to a plain node.
    pub fn empty() -> Self {
        Self {
            constructors: HashMap::new(),
        }
    }

    /// A registry seeded with the four built-in variants: `form`, `link`,
    /// `resource`, `error`.
    pub fn with_builtins() -> Self {
        let mut registry = Self::empty();
        registry.register("form", |n, a, c| Extension::Form(Form::from_parts(n, a, c)));
        registry.register("link", |n, a, c| Extension::Link(Link::from_parts(n, a, c)));
        registry.register("resource", |n, a, c| {
            Extension::Resource(Resource::from_parts(n, a, c))
        });
        registry.register("error", |n, a, c| {
            Extension::Error(ErrorNode::from_parts(n, a, c))
        });
        registry
    }

    /// Map `name` to `constructor`. Registering an existing name replaces
    /// the earlier entry. Intended for the setup phase, before any decode.
    pub fn register(&mut self, name: impl Into<String>, constructor: Constructor) {
        self.constructors.insert(name.into(), constructor);
    }

    /// Whether `name` has a registered constructor.
    pub fn is_registered(&self, name: &str) -> bool {
        self.constructors.contains_key(name)
    }

    /// Construct a value for a decoded extension-marked triple.
    ///
    /// Registered names dispatch to their constructor; unregistered names
    /// fall back to a plain [`Node`] carrying the same triple.
    pub fn make(&self, name: String, attributes: Map, content: Value) -> Value {
        match self.constructors.get(&name) {
            Some(constructor) => Value::Extension(constructor(name, attributes, content)),
            None => Value::Node(Node::new(name, attributes, content)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn form_tag_dispatches_to_form_variant() {
        let registry = Registry::with_builtins();
        let made = registry.make("form".into(), Map::new(), Value::Null);
        assert!(matches!(
            made,
            Value::Extension(Extension::Form(_))
        ));
    }

    #[test]
    fn unregistered_tag_falls_back_to_plain_node() {
        let registry = Registry::with_builtins();
        let mut attributes = Map::new();
        attributes.insert("x".into(), Value::Int(1));
        let made = registry.make("mystery".into(), attributes.clone(), Value::Int(2));
        match made {
            Value::Node(node) => {
                assert_eq!(node.name(), "mystery");
                assert_eq!(node.attributes(), &attributes);
                assert_eq!(node.content(), &Value::Int(2));
            }
            other => panic!("expected plain node, got {other:?}"),
        }
    }

    #[test]
    fn alias_registration_keeps_decoded_name() {
        let mut registry = Registry::with_builtins();
        registry.register("hyperlink", |n, a, c| {
            Extension::Link(crate::Link::from_parts(n, a, c))
        });
        let made = registry.make("hyperlink".into(), Map::new(), Value::Null);
        match made {
            Value::Extension(ext) => assert_eq!(ext.node().name(), "hyperlink"),
            other => panic!("expected extension, got {other:?}"),
        }
    }

    #[test]
    fn empty_registry_never_makes_extensions() {
        let registry = Registry::empty();
        let made = registry.make("form".into(), Map::new(), Value::Null);
        assert!(matches!(made, Value::Node(_)));
    }
}
