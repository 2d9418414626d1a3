//! URL resolution bound to a single decode operation.
//!
//! Every decoded tree resolves its url-carrying extensions against the
//! *effective URL* of the response it came from — the URL actually
//! answered after the fetch pipeline followed any redirects itself. One
//! [`Resolver`] is built per decode and applied to every node in that
//! tree, so nesting depth never changes the base.

use thiserror::Error;

use url::Url;

/// Errors turning a relative URL into an absolute one.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ResolveError {
    /// The base URL itself did not parse.
    #[error("invalid base URL {0:?}")]
    InvalidBase(String),

    /// The relative URL could not be joined against the base.
    #[error("cannot resolve {url:?} against {base:?}")]
    Join { url: String, base: String },
}

/// Rewrites possibly-relative URLs into absolute ones against a fixed base.
///
/// Built once per decode; reapplying a resolver with a different base to an
/// already-resolved tree is not supported — resolution runs exactly once,
/// during the decode walk.
#[derive(Debug, Clone)]
pub struct Resolver {
    base: Url,
}

impl Resolver {
    /// Parse `base` and bind a resolver to it.
    pub fn new(base: &str) -> Result<Self, ResolveError> {
        let base = Url::parse(base).map_err(|_| ResolveError::InvalidBase(base.to_string()))?;
        Ok(Self { base })
    }

    /// Bind a resolver to an already-parsed base URL.
    pub fn from_url(base: Url) -> Self {
        Self { base }
    }

    /// The base URL this resolver joins against.
    pub fn base(&self) -> &Url {
        &self.base
    }

    /// Join `url` against the base. Absolute inputs pass through unchanged
    /// (modulo normalisation).
    pub fn absolute(&self, url: &str) -> Result<String, ResolveError> {
        self.base
            .join(url)
            .map(String::from)
            .map_err(|_| ResolveError::Join {
                url: url.to_string(),
                base: self.base.to_string(),
            })
    }
}
