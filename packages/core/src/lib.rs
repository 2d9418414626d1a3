//! Core object model for the Glyphwire hypermedia IPC protocol.
//!
//! Glyphwire carries a tree of tagged `(name, attributes, content)` nodes
//! over HTTP. Some tags are *extensions* — nodes with protocol behaviour:
//! forms and links can be invoked (a further HTTP call), resources name
//! remote objects, and errors carry peer-reported failures as data. This
//! crate is the pure half of the protocol: the value model, the extension
//! registry, URL resolution, form argument binding, and the codec
//! boundary. The HTTP half lives in `glyphwire-client`.
//!
//! # Crate layout
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`value`] | The [`Value`] space: scalars, [`Blob`], lists, maps, tagged trees |
//! | [`node`] | [`Node`], [`Extension`] and its variants, binding and field access |
//! | [`registry`] | Tag-name → constructor dispatch via [`Registry`] |
//! | [`resolve`] | Relative-URL rewriting via [`Resolver`] |
//! | [`build`] | Constructors for assembling outgoing trees |
//! | [`codec`] | The [`Codec`] trait and the baseline [`codec::json::JsonCodec`] |
//!
//! # Quick start
//!
//! ```rust
//! use glyphwire::{build, Registry, Resolver};
//! use glyphwire::codec::{json::JsonCodec, Codec};
//!
//! // Assemble an outgoing tree and serialise it.
//! let tree = build::form("http://host/calc/add", ["a", "b"]);
//! let bytes = JsonCodec.dump(&tree).unwrap();
//!
//! // Decode it back, resolving URLs against the response's effective URL.
//! let registry = Registry::with_builtins();
//! let resolver = Resolver::new("http://host/calc/").unwrap();
//! let back = JsonCodec.parse(&bytes, &registry, &resolver).unwrap();
//! assert_eq!(back, tree);
//! ```

pub mod build;
pub mod codec;
pub mod node;
pub mod registry;
pub mod resolve;
pub mod value;

pub use codec::{ByteChunks, Codec, CodecError};
pub use node::{ArgumentError, ErrorNode, Extension, FieldError, Form, Link, Node, Resource};
pub use registry::{Constructor, Registry};
pub use resolve::{ResolveError, Resolver};
pub use value::{Blob, Map, Value};
