//! The platform operations the cache controller is written against.
//!
//! In the browser these are backed by `ServiceWorkerGlobalScope` (see
//! [crate::browser]); tests use an in-memory scope.

use async_trait::async_trait;
use futures::future::LocalBoxFuture;
use shared::ClientMessage;
use thiserror::Error;

/// Where a request's response will be used. Only navigations are treated
/// differently.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Destination {
    Document,
    Other,
}

/// The `type` of a fetched response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseKind {
    Basic,
    Cors,
    Default,
    Error,
    Opaque,
    OpaqueRedirect,
}

pub trait ScopeRequest {
    fn method(&self) -> String;
    fn url(&self) -> String;
    fn destination(&self) -> Destination;
}

pub trait ScopeResponse: Sized {
    fn status(&self) -> u16;
    fn kind(&self) -> ResponseKind;
    /// A second handle on the response. Bodies are single use, so the copy
    /// that gets cached has to be taken before the original is returned.
    fn try_clone(&self) -> Result<Self, ScopeError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScopeError {
    #[error("cache {operation} failed: {message}")]
    Cache {
        operation: &'static str,
        message: String,
    },
    #[error("fetch {url} failed: {message}")]
    Network { url: String, message: String },
    #[error("clients {operation} failed: {message}")]
    Clients {
        operation: &'static str,
        message: String,
    },
    #[error("{operation} failed: {message}")]
    Lifecycle {
        operation: &'static str,
        message: String,
    },
}

impl ScopeError {
    pub fn cache<M: ToString>(operation: &'static str, message: M) -> Self {
        Self::Cache {
            operation,
            message: message.to_string(),
        }
    }

    pub fn network<U: Into<String>, M: ToString>(url: U, message: M) -> Self {
        Self::Network {
            url: url.into(),
            message: message.to_string(),
        }
    }

    pub fn clients<M: ToString>(operation: &'static str, message: M) -> Self {
        Self::Clients {
            operation,
            message: message.to_string(),
        }
    }

    pub fn lifecycle<M: ToString>(operation: &'static str, message: M) -> Self {
        Self::Lifecycle {
            operation,
            message: message.to_string(),
        }
    }
}

/// Cache storage, network and client access of the hosting worker.
///
/// Futures are not `Send`: the browser runs the worker on a single thread.
/// Clones share the same underlying scope.
#[async_trait(?Send)]
pub trait WorkerScope: Clone + 'static {
    type Request: ScopeRequest + Clone + 'static;
    type Response: ScopeResponse + 'static;

    /// Opens `cache` and stores every url in it, or nothing if any fetch
    /// fails or returns a non-ok status
    async fn cache_add_all(&self, cache: &str, urls: &[String]) -> Result<(), ScopeError>;

    async fn cache_names(&self) -> Result<Vec<String>, ScopeError>;

    /// Deletes a whole partition. Ok(false) if it didn't exist.
    async fn cache_delete(&self, cache: &str) -> Result<bool, ScopeError>;

    /// Looks the request up across every partition
    async fn cache_match(
        &self,
        request: &Self::Request,
    ) -> Result<Option<Self::Response>, ScopeError>;

    async fn cache_match_url(&self, url: &str) -> Result<Option<Self::Response>, ScopeError>;

    async fn cache_put(
        &self,
        cache: &str,
        request: &Self::Request,
        response: Self::Response,
    ) -> Result<(), ScopeError>;

    async fn fetch(&self, request: &Self::Request) -> Result<Self::Response, ScopeError>;

    async fn skip_waiting(&self) -> Result<(), ScopeError>;

    async fn claim_clients(&self) -> Result<(), ScopeError>;

    /// Posts `message` to every connected client, returning how many got it
    async fn post_to_clients(&self, message: &ClientMessage) -> Result<usize, ScopeError>;

    /// Runs `task` on the worker's event loop without the caller waiting for it
    fn spawn_local(&self, task: LocalBoxFuture<'static, ()>);
}
