//! The blocking fetch pipeline.
//!
//! [`Client`] issues requests with transport-level redirects disabled and
//! implements the protocol's status branching itself:
//!
//! | Status | Behaviour |
//! |--------|-----------|
//! | `303 See Other` | resolve `Location` against the response URL, GET it (bounded recursion) |
//! | `204 No Content` | return [`Value::Null`]; the body is never decoded |
//! | `201 Created` | return a [`Link`] at the resolved `Location` |
//! | 4xx / 5xx | fail with [`FetchError::Status`] before any decode |
//! | otherwise | decode hypermedia bodies through the codec, or return raw bytes as a [`Blob`] |
//!
//! Decoded trees resolve their URLs against the response's *effective*
//! URL — the URL answered after this pipeline's own redirect handling —
//! so every node in one tree shares the same base.

use std::sync::Arc;

use reqwest::blocking::{Body, Client as HttpClient};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE, LOCATION, TRANSFER_ENCODING};
use reqwest::redirect::Policy;
use reqwest::{Method, StatusCode};
use thiserror::Error;
use tracing::debug;

use glyphwire::codec::json::JsonCodec;
use glyphwire::{
    ArgumentError, Blob, Codec, CodecError, Form, Link, Registry, ResolveError, Resolver, Value,
};

use crate::body::IterBody;

/// Chunk size handed to the codec when streaming a request body.
pub const DEFAULT_CHUNK_SIZE: usize = 4096;

/// How many `303 See Other` hops a single fetch may follow before failing.
pub const DEFAULT_MAX_REDIRECTS: usize = 8;

// ---------------------------------------------------------------------------
// FetchError
// ---------------------------------------------------------------------------

/// Errors from the fetch pipeline and the invocation surface built on it.
///
/// Failures the *peer* reports are not here: those decode successfully as
/// [`glyphwire::ErrorNode`] values and are returned as ordinary data.
/// Nothing in this layer retries.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The underlying HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with an error status. Carried before any body
    /// decoding is attempted.
    #[error("server returned status {0}")]
    Status(u16),

    /// A redirect chain exceeded the configured cap. The protocol's
    /// redirects compose by recursion, so a server loop would otherwise
    /// recurse without limit.
    #[error("redirect chain exceeded {0} hops")]
    TooManyRedirects(usize),

    /// A `303` or `201` response carried no usable `Location` header.
    #[error("{0} response carried no usable Location header")]
    MissingLocation(u16),

    /// An extension was invoked without a required attribute.
    #[error("extension is missing its {0:?} attribute")]
    MissingAttribute(&'static str),

    /// An extension's declared method is not a valid HTTP method token.
    #[error("{0:?} is not a valid HTTP method")]
    BadMethod(String),

    /// The codec's media type cannot be sent as an HTTP header value.
    #[error("codec media type {0:?} is not a valid header value")]
    BadMediaType(String),

    /// Encoding the request body or decoding the response body failed.
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// A `Location` header could not be resolved against the response URL.
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    /// Form argument binding failed.
    #[error(transparent)]
    Arguments(#[from] ArgumentError),
}

// ---------------------------------------------------------------------------
// CallArgs
// ---------------------------------------------------------------------------

/// Positional and keyword arguments for a form invocation.
///
/// ```rust
/// use glyphwire_client::CallArgs;
///
/// let args = CallArgs::new().arg(1i64).kwarg("b", 2i64);
/// assert_eq!(args.positional().len(), 1);
/// assert_eq!(args.keyword().len(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct CallArgs {
    positional: Vec<Value>,
    keyword: Vec<(String, Value)>,
}

impl CallArgs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a positional argument.
    pub fn arg(mut self, value: impl Into<Value>) -> Self {
        self.positional.push(value.into());
        self
    }

    /// Append a keyword argument.
    pub fn kwarg(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.keyword.push((name.into(), value.into()));
        self
    }

    pub fn positional(&self) -> &[Value] {
        &self.positional
    }

    pub fn keyword(&self) -> &[(String, Value)] {
        &self.keyword
    }
}

// ---------------------------------------------------------------------------
// Target
// ---------------------------------------------------------------------------

/// Anything [`Client::get`] can point at: a URL string, or an extension
/// that already knows its URL. Passing an already-fetched [`Link`] reads
/// its `url` attribute instead of re-fetching the referencing document.
pub trait Target {
    fn target_url(&self) -> Option<&str>;
}

impl Target for str {
    fn target_url(&self) -> Option<&str> {
        Some(self)
    }
}

impl Target for String {
    fn target_url(&self) -> Option<&str> {
        Some(self)
    }
}

impl Target for Link {
    fn target_url(&self) -> Option<&str> {
        self.url()
    }
}

impl Target for Form {
    fn target_url(&self) -> Option<&str> {
        self.url()
    }
}

impl Target for glyphwire::Resource {
    fn target_url(&self) -> Option<&str> {
        self.url()
    }
}

impl<T: Target + ?Sized> Target for &T {
    fn target_url(&self) -> Option<&str> {
        (**self).target_url()
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// A blocking Glyphwire client.
///
/// Owns a pooled HTTP client (with transport redirects disabled), the
/// extension [`Registry`] injected into every decode, and the [`Codec`]
/// that negotiates and matches the hypermedia media type. One fetch fully
/// completes — redirect recursion and body decode included — before
/// control returns.
pub struct Client {
    http: HttpClient,
    registry: Registry,
    codec: Arc<dyn Codec>,
    media_type: HeaderValue,
    max_redirects: usize,
    chunk_size: usize,
}

impl Client {
    /// A client with the built-in registry and the baseline JSON codec.
    pub fn new() -> Result<Self, FetchError> {
        Self::with_codec(Registry::with_builtins(), Arc::new(JsonCodec))
    }

    /// A client with an explicit registry and codec. Register additional
    /// extension tags on the registry before handing it over; the registry
    /// is read-only from here on.
    pub fn with_codec(registry: Registry, codec: Arc<dyn Codec>) -> Result<Self, FetchError> {
        let media_type = HeaderValue::from_str(codec.content_type())
            .map_err(|_| FetchError::BadMediaType(codec.content_type().to_string()))?;
        let http = HttpClient::builder().redirect(Policy::none()).build()?;
        Ok(Self {
            http,
            registry,
            codec,
            media_type,
            max_redirects: DEFAULT_MAX_REDIRECTS,
            chunk_size: DEFAULT_CHUNK_SIZE,
        })
    }

    /// Replace the redirect cap.
    pub fn with_max_redirects(mut self, max_redirects: usize) -> Self {
        self.max_redirects = max_redirects;
        self
    }

    /// Replace the streaming chunk size.
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    /// The registry injected into decodes.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    // -- invocation surface -------------------------------------------------

    /// GET a target with no query arguments or extra headers.
    pub fn get(&self, target: impl Target) -> Result<Value, FetchError> {
        self.get_with(target, &[], HeaderMap::new())
    }

    /// GET a target with query arguments and caller headers.
    pub fn get_with(
        &self,
        target: impl Target,
        args: &[(String, String)],
        headers: HeaderMap,
    ) -> Result<Value, FetchError> {
        let url = target
            .target_url()
            .ok_or(FetchError::MissingAttribute("url"))?;
        self.fetch(Method::GET, url, args, None, headers, false)
    }

    /// Invoke a form: bind `call` against its declared parameter names and
    /// send the bound pairs as the request body.
    ///
    /// Chunked transfer is used when any bound value is a [`Blob`] or the
    /// form carries an explicit override. The bound pairs travel as a list
    /// of `[name, value]` two-element lists, preserving order and
    /// duplicates.
    pub fn call_form(&self, form: &Form, call: &CallArgs) -> Result<Value, FetchError> {
        let pairs = form.bind(call.positional(), call.keyword())?;
        let chunked = form.wants_chunked(&pairs);
        let url = form.url().ok_or(FetchError::MissingAttribute("url"))?;
        let method = parse_method(form.method())?;
        let body = Value::List(
            pairs
                .into_iter()
                .map(|(name, value)| Value::List(vec![Value::Text(name), value]))
                .collect(),
        );
        self.fetch(method, url, &[], Some(&body), HeaderMap::new(), chunked)
    }

    /// Invoke a link. Inline links return their embedded content with no
    /// network call; everything else fetches the link's target with its
    /// declared method.
    pub fn follow(&self, link: &Link) -> Result<Value, FetchError> {
        if link.is_inline() {
            return Ok(link.content().clone());
        }
        let url = link.url().ok_or(FetchError::MissingAttribute("url"))?;
        let method = parse_method(link.method())?;
        self.fetch(method, url, &[], None, HeaderMap::new(), false)
    }

    // -- the pipeline -------------------------------------------------------

    /// Perform one fetch, following the protocol's status branching.
    ///
    /// `headers` are caller-supplied extras; the content-negotiation
    /// defaults (`Accept` and `Content-Type` set to the codec's media
    /// type) always win over them.
    pub fn fetch(
        &self,
        method: Method,
        url: &str,
        args: &[(String, String)],
        body: Option<&Value>,
        headers: HeaderMap,
        chunked: bool,
    ) -> Result<Value, FetchError> {
        self.fetch_depth(method, url, args, body, headers, chunked, self.max_redirects)
    }

    #[allow(clippy::too_many_arguments)]
    fn fetch_depth(
        &self,
        method: Method,
        url: &str,
        args: &[(String, String)],
        body: Option<&Value>,
        mut headers: HeaderMap,
        chunked: bool,
        redirects_left: usize,
    ) -> Result<Value, FetchError> {
        headers.insert(ACCEPT, self.media_type.clone());
        headers.insert(CONTENT_TYPE, self.media_type.clone());

        let mut request = self.http.request(method, url).headers(headers);
        if !args.is_empty() {
            request = request.query(args);
        }
        if let Some(value) = body {
            let stream = IterBody::new(self.codec.dump_iter(value, self.chunk_size)?, chunked);
            request = if chunked {
                request
                    .header(TRANSFER_ENCODING, "chunked")
                    .body(Body::new(stream))
            } else {
                request.body(stream.read_all())
            };
        }

        let response = request.send()?;
        let status = response.status();
        debug!(url, status = status.as_u16(), "fetched");

        match status {
            StatusCode::SEE_OTHER => {
                if redirects_left == 0 {
                    return Err(FetchError::TooManyRedirects(self.max_redirects));
                }
                let next = resolved_location(&response)?;
                debug!(location = next.as_str(), "following 303");
                self.fetch_depth(
                    Method::GET,
                    &next,
                    &[],
                    None,
                    HeaderMap::new(),
                    false,
                    redirects_left - 1,
                )
            }
            StatusCode::NO_CONTENT => Ok(Value::Null),
            StatusCode::CREATED => {
                let location = resolved_location(&response)?;
                Ok(Value::Extension(glyphwire::Extension::Link(Link::new(
                    location,
                ))))
            }
            s if s.is_client_error() || s.is_server_error() => {
                Err(FetchError::Status(s.as_u16()))
            }
            _ => {
                let media = response
                    .headers()
                    .get(CONTENT_TYPE)
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("")
                    .to_string();
                let effective = response.url().clone();
                let bytes = response.bytes()?;
                if media.starts_with(self.codec.content_type()) {
                    let resolver = Resolver::from_url(effective);
                    Ok(self.codec.parse(&bytes, &self.registry, &resolver)?)
                } else {
                    debug!(media = %media, "returning raw body");
                    let content_type = if media.is_empty() {
                        "application/octet-stream".to_string()
                    } else {
                        media
                    };
                    Ok(Value::Blob(Blob::new(bytes.to_vec(), content_type)))
                }
            }
        }
    }
}

/// Join the response's `Location` header against the response's own URL.
fn resolved_location(response: &reqwest::blocking::Response) -> Result<String, FetchError> {
    let status = response.status().as_u16();
    let location = response
        .headers()
        .get(LOCATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(FetchError::MissingLocation(status))?;
    let base = Resolver::from_url(response.url().clone());
    Ok(base.absolute(location)?)
}

/// Parse an extension's declared method attribute, uppercased.
fn parse_method(method: &str) -> Result<Method, FetchError> {
    Method::from_bytes(method.to_ascii_uppercase().as_bytes())
        .map_err(|_| FetchError::BadMethod(method.to_string()))
}
