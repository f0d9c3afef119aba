//! Social-post adapter contract
//!
//! An adapter turns a post URL into the post's author PID and text body. The
//! core never talks to a platform itself; concrete adapters are registered in
//! an [`AdapterRegistry`] by whoever embeds the library.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use url::Url;

use crate::assertion;
use crate::error::FormatError;
use crate::{Pid, Result};

/// A fetched social post
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Post {
    pub author: Pid,
    pub body: String,
}

/// Failures while turning a URL into a [`Post`]
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AdapterError {
    #[error("invalid post URL '{0}'")]
    InvalidUrl(String),

    #[error("no adapter handles post URL '{0}'")]
    UnsupportedUrl(String),

    #[error("{platform} unreachable: {reason}")]
    Unreachable {
        platform: &'static str,
        reason: String,
    },

    #[error("no assertion found in post {0}")]
    NoAssertionFound(String),

    #[error("post URL names {expected} but the post was written by {actual}")]
    AuthorMismatch { expected: String, actual: String },

    #[error("{platform} adapter unavailable: {reason}")]
    Unavailable {
        platform: &'static str,
        reason: String,
    },
}

impl AdapterError {
    /// Only transport failures may go away on their own
    pub fn is_retryable(&self) -> bool {
        matches!(self, AdapterError::Unreachable { .. })
    }
}

/// One social platform
#[async_trait]
pub trait Adapter: Send + Sync {
    /// Platform name used in logs and errors
    fn platform(&self) -> &'static str;

    /// Whether `url` is a post URL of this platform
    fn handles(&self, url: &Url) -> bool;

    /// Fetch the post at `url`
    async fn fetch(&self, url: &Url) -> std::result::Result<Post, AdapterError>;
}

/// An assertion located inside a fetched post
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedAssertion {
    pub fields: Vec<String>,
    pub poster: Pid,
    pub url: String,
}

/// Ordered dispatch table; the first adapter that handles a URL wins
#[derive(Clone, Default)]
pub struct AdapterRegistry {
    adapters: Vec<Arc<dyn Adapter>>,
}

impl AdapterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, adapter: impl Adapter + 'static) -> Self {
        self.register(Arc::new(adapter));
        self
    }

    pub fn register(&mut self, adapter: Arc<dyn Adapter>) {
        self.adapters.push(adapter);
    }

    pub fn resolve(&self, url: &Url) -> Option<&Arc<dyn Adapter>> {
        self.adapters.iter().find(|a| a.handles(url))
    }

    pub fn platforms(&self) -> Vec<&'static str> {
        self.adapters.iter().map(|a| a.platform()).collect()
    }

    /// Fetch the post at `url` with the first adapter that handles it
    pub async fn fetch_post(&self, url: &str) -> std::result::Result<Post, AdapterError> {
        let parsed = Url::parse(url).map_err(|_| AdapterError::InvalidUrl(url.to_string()))?;
        let adapter = self
            .resolve(&parsed)
            .ok_or_else(|| AdapterError::UnsupportedUrl(url.to_string()))?;

        tracing::debug!(platform = adapter.platform(), %url, "fetching post");
        adapter.fetch(&parsed).await
    }

    /// Fetch the post at `url` and split its assertion into
    /// `expected_fields` fields
    pub async fn fetch_assertion(
        &self,
        url: &str,
        expected_fields: usize,
    ) -> Result<FetchedAssertion> {
        let post = self.fetch_post(url).await?;
        let fields = match assertion::locate(&post.body, expected_fields) {
            Ok(fields) => fields,
            Err(FormatError::NotFound { .. }) => {
                return Err(AdapterError::NoAssertionFound(url.to_string()).into())
            }
            Err(e) => return Err(e.into()),
        };
        Ok(FetchedAssertion {
            fields,
            poster: post.author,
            url: url.to_string(),
        })
    }
}

impl fmt::Debug for AdapterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdapterRegistry")
            .field("platforms", &self.platforms())
            .finish()
    }
}
