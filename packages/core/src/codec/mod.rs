//! The codec boundary: byte-level encoding behind a trait.
//!
//! The tree layer treats the wire format as opaque. A [`Codec`] turns a
//! [`Value`] into bytes (`dump`, `dump_iter`) and bytes back into a value
//! (`parse`), dispatching extension-marked nodes through a
//! [`Registry`] and resolving their URLs through a [`Resolver`] supplied
//! by the fetch pipeline. The codec's [`content_type`](Codec::content_type)
//! doubles as the `Accept`/`Content-Type` negotiation value and as the
//! match criterion for deciding whether a response body is hypermedia.
//!
//! [`json::JsonCodec`] is the baseline implementation.

pub mod json;

use thiserror::Error;

use crate::registry::Registry;
use crate::resolve::{ResolveError, Resolver};
use crate::value::Value;

/// A lazy, single-pass sequence of byte chunks produced by
/// [`Codec::dump_iter`].
pub type ByteChunks = Box<dyn Iterator<Item = Vec<u8>> + Send>;

/// Errors crossing the codec boundary.
#[derive(Debug, Error)]
pub enum CodecError {
    /// The payload is not syntactically valid for this codec.
    #[error("payload is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The payload parsed but violates the tree encoding.
    #[error("malformed payload: {0}")]
    Malformed(String),

    /// The value cannot be represented in this codec's wire format.
    #[error("value cannot be encoded: {0}")]
    Unencodable(String),

    /// A decoded URL could not be resolved against the response base.
    #[error(transparent)]
    Resolve(#[from] ResolveError),
}

/// Serialises and deserialises Glyphwire trees.
pub trait Codec: Send + Sync {
    /// The media type this codec negotiates and matches on.
    fn content_type(&self) -> &str;

    /// Serialise a value to bytes.
    fn dump(&self, value: &Value) -> Result<Vec<u8>, CodecError>;

    /// Serialise a value as a sequence of byte chunks of at most
    /// `chunk_size` bytes, for streaming request bodies.
    fn dump_iter(&self, value: &Value, chunk_size: usize) -> Result<ByteChunks, CodecError> {
        let bytes = self.dump(value)?;
        let chunks: Vec<Vec<u8>> = bytes
            .chunks(chunk_size.max(1))
            .map(<[u8]>::to_vec)
            .collect();
        Ok(Box::new(chunks.into_iter()))
    }

    /// Deserialise bytes into a value tree.
    ///
    /// Extension-marked nodes dispatch through `registry` and resolve
    /// their URLs through `resolver`, bottom-up, as the walk constructs
    /// each node.
    fn parse(
        &self,
        bytes: &[u8],
        registry: &Registry,
        resolver: &Resolver,
    ) -> Result<Value, CodecError>;
}
