//! Tagged nodes and the invocable extension variants built on them.
//!
//! A [`Node`] is the generic `(name, attributes, content)` triple. An
//! [`Extension`] is a node whose tag name was recognised by the
//! [`Registry`](crate::Registry) at decode time and therefore carries
//! protocol behaviour:
//!
//! | Variant | Attributes | Behaviour |
//! |---------|-----------|-----------|
//! | [`Form`] | `method`, `url`, `values?` | invocable; binds arguments and POSTs them |
//! | [`Link`] | `method`, `url`, `inline?` | invocable; fetches its target (or returns inline content) |
//! | [`Resource`] | `name`, `url` | a remote object identity; field access delegates to content |
//! | [`ErrorNode`] | `logref`, `message` | a peer-reported failure, returned as data |
//!
//! Invocation itself lives in the client crate; this module holds the pure
//! parts — attribute contracts, argument binding, and URL resolution.

use thiserror::Error;

use crate::resolve::{ResolveError, Resolver};
use crate::value::{Map, Value};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors from keyed content lookup on a node.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FieldError {
    /// The content map has no entry under this key.
    #[error("no such field {0:?}")]
    Missing(String),

    /// The node's content is not a map, so keyed lookup is meaningless.
    #[error("node {0:?} has no keyed content")]
    NotAMap(String),
}

/// Errors from binding call arguments against a form's declared parameters.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ArgumentError {
    /// Positional arguments were supplied but the form declares no
    /// parameter names to pair them with.
    #[error("form declares no parameter names; positional arguments are not accepted")]
    NoUnnamedArguments,

    /// A keyword argument does not appear in the form's declared names.
    #[error("unknown argument {0:?}")]
    UnknownArgument(String),
}

// ---------------------------------------------------------------------------
// Node
// ---------------------------------------------------------------------------

/// A generic tagged value: `name`, `attributes`, `content`.
///
/// Immutable once constructed, except that decoding rewrites url-carrying
/// attributes exactly once through a [`Resolver`]. Field access with
/// [`Node::field`] reads from `content`, never from `attributes`.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    name: String,
    attributes: Map,
    content: Box<Value>,
}

impl Node {
    pub fn new(name: impl Into<String>, attributes: Map, content: Value) -> Self {
        Self {
            name: name.into(),
            attributes,
            content: Box::new(content),
        }
    }

    /// The tag name.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn attributes(&self) -> &Map {
        &self.attributes
    }

    pub fn content(&self) -> &Value {
        &self.content
    }

    /// Look up a key in this node's content map.
    ///
    /// Fails with [`FieldError::Missing`] when the key is absent and
    /// [`FieldError::NotAMap`] when the content is not keyed at all.
    pub fn field(&self, key: &str) -> Result<&Value, FieldError> {
        match &*self.content {
            Value::Map(map) => map
                .get(key)
                .ok_or_else(|| FieldError::Missing(key.to_string())),
            _ => Err(FieldError::NotAMap(self.name.clone())),
        }
    }

    /// Attribute as text, when present and textual.
    fn attr_text(&self, key: &str) -> Option<&str> {
        match self.attributes.get(key) {
            Some(Value::Text(s)) => Some(s),
            _ => None,
        }
    }

    /// Rewrite the `url` attribute through `resolver`, when present.
    ///
    /// Absent or non-text `url` attributes are left alone; the gap surfaces
    /// at invocation time instead of failing the whole decode.
    fn resolve_url_attribute(&mut self, resolver: &Resolver) -> Result<(), ResolveError> {
        if let Some(Value::Text(raw)) = self.attributes.get("url") {
            let absolute = resolver.absolute(raw)?;
            self.attributes.insert("url".into(), Value::Text(absolute));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Extension
// ---------------------------------------------------------------------------

/// A tagged node with protocol behaviour, dispatched by tag name through
/// the [`Registry`](crate::Registry).
///
/// Extensions compare structurally, like nodes — but an `Extension` value
/// never equals a plain [`Node`] value, since [`Value`](crate::Value) keeps
/// them in separate variants.
#[derive(Debug, Clone, PartialEq)]
pub enum Extension {
    Form(Form),
    Link(Link),
    Resource(Resource),
    Error(ErrorNode),
}

impl Extension {
    /// The underlying node triple.
    pub fn node(&self) -> &Node {
        match self {
            Extension::Form(f) => &f.node,
            Extension::Link(l) => &l.node,
            Extension::Resource(r) => &r.node,
            Extension::Error(e) => &e.node,
        }
    }

    /// Rewrite relative URLs against the decode's effective base URL.
    ///
    /// Runs exactly once per decoded extension, bottom-up, during the
    /// decode walk. Url-carrying variants rewrite their `url` attribute;
    /// [`ErrorNode`] carries no URL and is a no-op.
    pub fn resolve(&mut self, resolver: &Resolver) -> Result<(), ResolveError> {
        match self {
            Extension::Form(f) => f.node.resolve_url_attribute(resolver),
            Extension::Link(l) => l.node.resolve_url_attribute(resolver),
            Extension::Resource(r) => r.node.resolve_url_attribute(resolver),
            Extension::Error(_) => Ok(()),
        }
    }
}

// ---------------------------------------------------------------------------
// Form
// ---------------------------------------------------------------------------

/// An invocable form: `method` (default `POST`), `url`, and an optional
/// ordered list of parameter names under `values`.
///
/// Binding is pure and lives here; the HTTP side of invocation lives in
/// the client crate.
#[derive(Debug, Clone)]
pub struct Form {
    node: Node,
    /// Transport override: force (or suppress) chunked transfer regardless
    /// of whether a bound value is a blob. Does not participate in
    /// structural equality.
    chunked: Option<bool>,
}

/// Structural equality on the node triple only.
impl PartialEq for Form {
    fn eq(&self, other: &Self) -> bool {
        self.node == other.node
    }
}

impl Form {
    /// A `POST` form at `url` with no declared parameter names.
    pub fn new(url: impl Into<String>) -> Self {
        let mut attributes = Map::new();
        attributes.insert("method".into(), Value::Text("POST".into()));
        attributes.insert("url".into(), Value::Text(url.into()));
        attributes.insert("values".into(), Value::Null);
        Self {
            node: Node::new("form", attributes, Value::Null),
            chunked: None,
        }
    }

    /// Raw constructor used by the registry; does not validate attributes.
    pub fn from_parts(name: impl Into<String>, attributes: Map, content: Value) -> Self {
        Self {
            node: Node::new(name, attributes, content),
            chunked: None,
        }
    }

    /// Replace the HTTP method.
    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.node
            .attributes
            .insert("method".into(), Value::Text(method.into()));
        self
    }

    /// Declare the ordered parameter names callers may bind.
    pub fn with_values<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let list = names
            .into_iter()
            .map(|n| Value::Text(n.into()))
            .collect::<Vec<_>>();
        self.node.attributes.insert("values".into(), Value::List(list));
        self
    }

    /// Force or suppress chunked transfer for this form's invocations.
    pub fn with_chunked(mut self, chunked: bool) -> Self {
        self.chunked = Some(chunked);
        self
    }

    pub fn node(&self) -> &Node {
        &self.node
    }

    /// The HTTP method, defaulting to `POST`.
    pub fn method(&self) -> &str {
        self.node.attr_text("method").unwrap_or("POST")
    }

    /// The form's target URL, when its attributes carry one.
    pub fn url(&self) -> Option<&str> {
        self.node.attr_text("url")
    }

    /// The declared parameter names, in order. Empty when `values` is
    /// absent or null.
    pub fn values(&self) -> Vec<&str> {
        match self.node.attributes.get("values") {
            Some(Value::List(items)) => items
                .iter()
                .filter_map(|v| v.as_text())
                .collect(),
            _ => Vec::new(),
        }
    }

    /// The explicit chunked-transfer override, if one was set.
    pub fn chunked_override(&self) -> Option<bool> {
        self.chunked
    }

    /// Pair call arguments with this form's declared parameter names.
    ///
    /// Positional arguments zip with the declared names in order (extra
    /// positionals beyond the declared names are dropped, as the zip stops
    /// at the shorter side). Keyword arguments must name a declared
    /// parameter. Positional and keyword bindings are concatenated without
    /// deduplication, so a name bound both ways appears twice — a known
    /// quirk of the protocol, kept as-is.
    pub fn bind(
        &self,
        positional: &[Value],
        keyword: &[(String, Value)],
    ) -> Result<Vec<(String, Value)>, ArgumentError> {
        let names = self.values();
        let mut pairs = Vec::with_capacity(positional.len() + keyword.len());

        if !names.is_empty() {
            for (name, value) in names.iter().zip(positional.iter()) {
                pairs.push((name.to_string(), value.clone()));
            }
        } else if !positional.is_empty() {
            return Err(ArgumentError::NoUnnamedArguments);
        }

        for (key, value) in keyword {
            if names.iter().any(|n| *n == key.as_str()) {
                pairs.push((key.clone(), value.clone()));
            } else {
                return Err(ArgumentError::UnknownArgument(key.clone()));
            }
        }

        Ok(pairs)
    }

    /// Whether an invocation with these bound pairs should use chunked
    /// transfer: the explicit override wins, otherwise any blob among the
    /// bound values forces it.
    pub fn wants_chunked(&self, pairs: &[(String, Value)]) -> bool {
        self.chunked
            .unwrap_or_else(|| pairs.iter().any(|(_, v)| matches!(v, Value::Blob(_))))
    }
}

// ---------------------------------------------------------------------------
// Link
// ---------------------------------------------------------------------------

/// An invocable reference: `method` (default `GET`), `url`, and an
/// optional `inline` flag. An inline link already carries its target's
/// content, so invoking it never touches the network.
#[derive(Debug, Clone, PartialEq)]
pub struct Link {
    node: Node,
}

impl Link {
    /// A `GET` link to `url`.
    pub fn new(url: impl Into<String>) -> Self {
        let mut attributes = Map::new();
        attributes.insert("method".into(), Value::Text("GET".into()));
        attributes.insert("url".into(), Value::Text(url.into()));
        Self {
            node: Node::new("link", attributes, Value::Null),
        }
    }

    /// A link whose content is embedded in the response that carried it.
    pub fn inline(url: impl Into<String>, content: Value) -> Self {
        let mut attributes = Map::new();
        attributes.insert("method".into(), Value::Text("GET".into()));
        attributes.insert("url".into(), Value::Text(url.into()));
        attributes.insert("inline".into(), Value::Bool(true));
        Self {
            node: Node::new("link", attributes, content),
        }
    }

    /// Raw constructor used by the registry; does not validate attributes.
    pub fn from_parts(name: impl Into<String>, attributes: Map, content: Value) -> Self {
        Self {
            node: Node::new(name, attributes, content),
        }
    }

    /// Replace the HTTP method.
    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.node
            .attributes
            .insert("method".into(), Value::Text(method.into()));
        self
    }

    pub fn node(&self) -> &Node {
        &self.node
    }

    /// The HTTP method, defaulting to `GET`.
    pub fn method(&self) -> &str {
        self.node.attr_text("method").unwrap_or("GET")
    }

    /// The link target, when its attributes carry one. Used by the
    /// client's `get` helper to avoid re-fetching already-fetched
    /// references.
    pub fn url(&self) -> Option<&str> {
        self.node.attr_text("url")
    }

    /// Whether the target's content is embedded in this link.
    pub fn is_inline(&self) -> bool {
        matches!(self.node.attributes.get("inline"), Some(Value::Bool(true)))
    }

    /// The embedded content (meaningful for inline links).
    pub fn content(&self) -> &Value {
        self.node.content()
    }
}

// ---------------------------------------------------------------------------
// Resource
// ---------------------------------------------------------------------------

/// A remote object identity: a `name` (the object's class on the peer) and
/// its canonical `url`. Field access delegates to the nested content like
/// a plain node.
#[derive(Debug, Clone, PartialEq)]
pub struct Resource {
    node: Node,
}

impl Resource {
    /// Describe an object of class `name` living at `url`.
    pub fn new(name: impl Into<String>, url: impl Into<String>, content: Value) -> Self {
        let mut attributes = Map::new();
        attributes.insert("name".into(), Value::Text(name.into()));
        attributes.insert("url".into(), Value::Text(url.into()));
        Self {
            node: Node::new("resource", attributes, content),
        }
    }

    /// Raw constructor used by the registry; does not validate attributes.
    pub fn from_parts(name: impl Into<String>, attributes: Map, content: Value) -> Self {
        Self {
            node: Node::new(name, attributes, content),
        }
    }

    pub fn node(&self) -> &Node {
        &self.node
    }

    /// The peer-side class name of the backing object.
    pub fn class_name(&self) -> Option<&str> {
        self.node.attr_text("name")
    }

    /// The object's canonical URL.
    pub fn url(&self) -> Option<&str> {
        self.node.attr_text("url")
    }

    /// Keyed lookup in the resource's content, like [`Node::field`].
    pub fn field(&self, key: &str) -> Result<&Value, FieldError> {
        self.node.field(key)
    }
}

// ---------------------------------------------------------------------------
// ErrorNode
// ---------------------------------------------------------------------------

/// A peer-reported failure, decoded as ordinary data.
///
/// A semantically failed operation still decodes successfully — the peer
/// answers with an error node rather than a failing status. Telling
/// "transport failed" apart from "peer reported an application error" is
/// the caller's job: inspect the returned value's tag.
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorNode {
    node: Node,
}

impl ErrorNode {
    /// Build an error report with a correlation id and a message.
    pub fn new(logref: impl Into<Value>, message: impl Into<String>) -> Self {
        let mut attributes = Map::new();
        attributes.insert("logref".into(), logref.into());
        attributes.insert("message".into(), Value::Text(message.into()));
        Self {
            node: Node::new("error", attributes, Value::Map(Map::new())),
        }
    }

    /// Raw constructor used by the registry; does not validate attributes.
    pub fn from_parts(name: impl Into<String>, attributes: Map, content: Value) -> Self {
        Self {
            node: Node::new(name, attributes, content),
        }
    }

    pub fn node(&self) -> &Node {
        &self.node
    }

    /// The human-readable failure message.
    pub fn message(&self) -> Option<&str> {
        self.node.attr_text("message")
    }

    /// The correlation id the peer logged this failure under.
    pub fn logref(&self) -> Option<&Value> {
        self.node.attributes.get("logref")
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn content_map() -> Value {
        let mut m = Map::new();
        m.insert("k".into(), Value::Int(1));
        Value::Map(m)
    }

    #[test]
    fn field_reads_content_not_attributes() {
        let mut attributes = Map::new();
        attributes.insert("k".into(), Value::Int(99));
        let node = Node::new("n", attributes, content_map());
        assert_eq!(node.field("k"), Ok(&Value::Int(1)));
    }

    #[test]
    fn missing_field_is_an_error() {
        let node = Node::new("n", Map::new(), content_map());
        assert_eq!(
            node.field("absent"),
            Err(FieldError::Missing("absent".into()))
        );
    }

    #[test]
    fn field_on_scalar_content_is_an_error() {
        let node = Node::new("n", Map::new(), Value::Int(5));
        assert_eq!(node.field("k"), Err(FieldError::NotAMap("n".into())));
    }

    #[test]
    fn structural_equality() {
        let a = Node::new("n", Map::new(), Value::Int(1));
        let b = Node::new("n", Map::new(), Value::Int(1));
        let c = Node::new("n", Map::new(), Value::Int(2));
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn extension_never_equals_plain_node() {
        let link = Link::new("http://example.org/x");
        let plain = Node::new(
            link.node().name(),
            link.node().attributes().clone(),
            link.node().content().clone(),
        );
        assert_ne!(Value::Extension(Extension::Link(link)), Value::Node(plain));
    }

    #[test]
    fn form_binds_positional_then_keyword() {
        let form = Form::new("http://example.org/f").with_values(["a", "b"]);
        let pairs = form
            .bind(&[Value::Int(7)], &[("b".into(), Value::Int(2))])
            .unwrap();
        assert_eq!(
            pairs,
            vec![("a".into(), Value::Int(7)), ("b".into(), Value::Int(2))]
        );
    }

    #[test]
    fn form_rejects_positional_without_declared_names() {
        let form = Form::new("http://example.org/f");
        assert_eq!(
            form.bind(&[Value::Int(1)], &[]),
            Err(ArgumentError::NoUnnamedArguments)
        );
    }

    #[test]
    fn form_rejects_unknown_keyword() {
        let form = Form::new("http://example.org/f").with_values(["a", "b"]);
        assert_eq!(
            form.bind(&[], &[("c".into(), Value::Int(1))]),
            Err(ArgumentError::UnknownArgument("c".into()))
        );
    }

    #[test]
    fn duplicate_binding_is_kept() {
        // Known quirk: a name bound positionally and by keyword appears twice.
        let form = Form::new("http://example.org/f").with_values(["a"]);
        let pairs = form
            .bind(&[Value::Int(1)], &[("a".into(), Value::Int(2))])
            .unwrap();
        assert_eq!(
            pairs,
            vec![("a".into(), Value::Int(1)), ("a".into(), Value::Int(2))]
        );
    }

    #[test]
    fn extra_positionals_are_dropped_by_zip() {
        let form = Form::new("http://example.org/f").with_values(["a"]);
        let pairs = form.bind(&[Value::Int(1), Value::Int(2)], &[]).unwrap();
        assert_eq!(pairs, vec![("a".into(), Value::Int(1))]);
    }

    #[test]
    fn blob_argument_forces_chunked() {
        use crate::value::Blob;

        let form = Form::new("http://example.org/f").with_values(["payload"]);
        let pairs = form
            .bind(&[Value::Blob(Blob::octet_stream(b"data".to_vec()))], &[])
            .unwrap();
        assert!(form.wants_chunked(&pairs));

        let plain = form.bind(&[], &[]).unwrap();
        assert!(!form.wants_chunked(&plain));
    }

    #[test]
    fn chunked_override_wins_over_blob_detection() {
        let form = Form::new("http://example.org/f")
            .with_values(["payload"])
            .with_chunked(false);
        let pairs = form
            .bind(
                &[Value::Blob(crate::value::Blob::octet_stream(b"x".to_vec()))],
                &[],
            )
            .unwrap();
        assert!(!form.wants_chunked(&pairs));
    }

    #[test]
    fn resolve_rewrites_url_attributes() {
        let resolver = Resolver::new("http://host/base/").unwrap();
        let mut ext = Extension::Link(Link::new("x"));
        ext.resolve(&resolver).unwrap();
        match &ext {
            Extension::Link(l) => assert_eq!(l.url(), Some("http://host/base/x")),
            other => panic!("unexpected variant: {other:?}"),
        }
    }

    #[test]
    fn error_node_resolve_is_a_noop() {
        let resolver = Resolver::new("http://host/").unwrap();
        let mut ext = Extension::Error(ErrorNode::new(Value::Int(42), "boom"));
        let before = ext.clone();
        ext.resolve(&resolver).unwrap();
        assert_eq!(ext, before);
    }

    #[test]
    fn error_node_accessors() {
        let e = ErrorNode::new(Value::Text("ref-1".into()), "it broke");
        assert_eq!(e.message(), Some("it broke"));
        assert_eq!(e.logref(), Some(&Value::Text("ref-1".into())));
    }

    #[test]
    fn inline_link_carries_content() {
        let l = Link::inline("http://example.org/x", Value::Int(3));
        assert!(l.is_inline());
        assert_eq!(l.content(), &Value::Int(3));
        assert!(!Link::new("http://example.org/x").is_inline());
    }
}
