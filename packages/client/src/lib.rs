//! Blocking HTTP client for the Glyphwire hypermedia IPC protocol.
//!
//! A Glyphwire server answers with a tree of tagged nodes; some of them —
//! forms and links — are invocable references bound to the URL the
//! response was actually served from. This crate is the transport half of
//! the protocol: it fetches, handles the status branching (redirects,
//! empty bodies, created resources) itself, decodes hypermedia bodies
//! through the codec in `glyphwire`, and exposes the invocation surface
//! over the decoded extensions.
//!
//! # Crate layout
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`client`] | [`Client`], the fetch pipeline, [`CallArgs`], [`Target`] |
//! | [`body`] | [`IterBody`], the streaming request-body adapter |
//!
//! # Quick start
//!
//! ```rust,no_run
//! use glyphwire::{Extension, Value};
//! use glyphwire_client::{CallArgs, Client};
//!
//! let client = Client::new()?;
//!
//! // Fetch the service root and invoke a form it advertises.
//! let root = client.get("http://localhost:9000/")?;
//! if let Value::Map(map) = &root {
//!     if let Some(Value::Extension(Extension::Form(add))) = map.get("add") {
//!         let sum = client.call_form(add, &CallArgs::new().arg(1i64).arg(2i64))?;
//!         println!("{sum:?}");
//!     }
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod body;
pub mod client;

pub use body::IterBody;
pub use client::{
    CallArgs, Client, FetchError, Target, DEFAULT_CHUNK_SIZE, DEFAULT_MAX_REDIRECTS,
};
