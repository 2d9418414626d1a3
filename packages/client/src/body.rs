//! Streaming request-body adapter.
//!
//! [`IterBody`] turns the codec's lazy chunk sequence into a pull-based
//! body the transport can consume: eagerly drained for plain requests,
//! framed per chunked transfer-encoding for streaming ones. It is a
//! single-owner, single-pass, stateful iterator — not restartable.

use std::io::{self, Read};

use glyphwire::ByteChunks;

/// Adapts a single-pass sequence of byte chunks into a request body.
///
/// With `chunked` set, each pulled chunk is framed as
/// `<hex length>\r\n<bytes>\r\n`, including the terminating zero-length
/// chunk. The adapter latches exhaustion one call *after* the underlying
/// sequence produces an empty chunk: the call that observes the empty
/// chunk still emits the terminator frame, and every later call yields
/// nothing.
pub struct IterBody {
    chunks: ByteChunks,
    chunked: bool,
    eof: bool,
    /// Unconsumed remainder of the current frame, for the [`Read`] impl.
    pending: Vec<u8>,
}

impl IterBody {
    pub fn new(chunks: ByteChunks, chunked: bool) -> Self {
        Self {
            chunks,
            chunked,
            eof: false,
            pending: Vec::new(),
        }
    }

    /// Whether this body frames its chunks for chunked transfer.
    pub fn is_chunked(&self) -> bool {
        self.chunked
    }

    /// Eagerly drain and concatenate the remaining chunks, unframed.
    /// Used for non-chunked requests, which send a fully materialised body.
    pub fn read_all(mut self) -> Vec<u8> {
        let mut out = std::mem::take(&mut self.pending);
        for chunk in self.chunks.by_ref() {
            out.extend_from_slice(&chunk);
        }
        out
    }

    /// Pull one chunk and frame it.
    ///
    /// Returns `None` once exhaustion was latched on a *prior* call — even
    /// though a fresh frame was computed, it is discarded. Exhaustion is
    /// latched on the call that pulls an empty underlying chunk, which is
    /// also the call that emits the `0\r\n\r\n` terminator.
    pub fn next_frame(&mut self) -> Option<Vec<u8>> {
        let data = self.chunks.next().unwrap_or_default();
        let was_exhausted = self.eof;
        if data.is_empty() {
            self.eof = true;
        }
        if was_exhausted {
            return None;
        }
        Some(if self.chunked {
            let mut frame = format!("{:X}\r\n", data.len()).into_bytes();
            frame.extend_from_slice(&data);
            frame.extend_from_slice(b"\r\n");
            frame
        } else {
            data
        })
    }
}

impl Read for IterBody {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        while self.pending.is_empty() {
            match self.next_frame() {
                Some(frame) if frame.is_empty() => continue,
                Some(frame) => self.pending = frame,
                None => return Ok(0),
            }
        }
        let n = self.pending.len().min(buf.len());
        buf[..n].copy_from_slice(&self.pending[..n]);
        self.pending.drain(..n);
        Ok(n)
    }
}

impl std::fmt::Debug for IterBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IterBody")
            .field("chunked", &self.chunked)
            .field("eof", &self.eof)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn chunks(parts: &[&[u8]]) -> ByteChunks {
        let owned: Vec<Vec<u8>> = parts.iter().map(|p| p.to_vec()).collect();
        Box::new(owned.into_iter())
    }

    #[test]
    fn chunked_framing_sequence() {
        let mut body = IterBody::new(chunks(&[b"abc"]), true);
        assert_eq!(body.next_frame().as_deref(), Some(b"3\r\nabc\r\n".as_ref()));
        assert_eq!(body.next_frame().as_deref(), Some(b"0\r\n\r\n".as_ref()));
        assert_eq!(body.next_frame(), None);
        // Exhaustion is stable.
        assert_eq!(body.next_frame(), None);
    }

    #[test]
    fn frame_lengths_are_hexadecimal() {
        let payload = vec![b'x'; 26];
        let mut body = IterBody::new(chunks(&[&payload]), true);
        let frame = body.next_frame().unwrap();
        assert!(frame.starts_with(b"1A\r\n"));
        assert!(frame.ends_with(b"\r\n"));
    }

    #[test]
    fn unchunked_frames_pass_through_raw() {
        let mut body = IterBody::new(chunks(&[b"abc", b"def"]), false);
        assert_eq!(body.next_frame().as_deref(), Some(b"abc".as_ref()));
        assert_eq!(body.next_frame().as_deref(), Some(b"def".as_ref()));
        // The empty pull is returned once, then exhaustion latches.
        assert_eq!(body.next_frame().as_deref(), Some(b"".as_ref()));
        assert_eq!(body.next_frame(), None);
    }

    #[test]
    fn read_all_concatenates_unframed() {
        let body = IterBody::new(chunks(&[b"abc", b"def"]), true);
        // read_all ignores framing even on a chunked adapter.
        assert_eq!(body.read_all(), b"abcdef");
    }

    #[test]
    fn read_impl_streams_framed_bytes() {
        let mut body = IterBody::new(chunks(&[b"abc"]), true);
        let mut out = Vec::new();
        body.read_to_end(&mut out).unwrap();
        assert_eq!(out, b"3\r\nabc\r\n0\r\n\r\n");
    }

    #[test]
    fn read_impl_honours_small_buffers() {
        let mut body = IterBody::new(chunks(&[b"abc"]), true);
        let mut buf = [0u8; 2];
        let mut out = Vec::new();
        loop {
            let n = body.read(&mut buf).unwrap();
            if n == 0 {
                break;
            }
            out.extend_from_slice(&buf[..n]);
        }
        assert_eq!(out, b"3\r\nabc\r\n0\r\n\r\n");
    }
}
