use std::{
    cell::Cell,
    fmt::{self, Display},
};

use futures::{future::try_join_all, try_join, FutureExt};
use shared::{ClientMessage, ControlMessage, SkipRule, VersionReply, WorkerConfig};
use tracing::{debug, error, info, warn};

use crate::{
    errors::WorkerError,
    scope::{Destination, ResponseKind, ScopeError, ScopeRequest, ScopeResponse, WorkerScope},
};

/// Lifecycle phase of a worker version
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Installing,
    /// Precached and waiting to activate
    Installed,
    Activating,
    Activated,
    /// Install failed, the browser keeps the previous version
    Redundant,
}

/// Why a request goes straight to the network
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Bypass<'a> {
    Method(String),
    Rule(&'a SkipRule),
}

impl Display for Bypass<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Bypass::Method(method) => write!(f, "method {method}"),
            Bypass::Rule(rule) => write!(f, "skip rule {rule}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route<'a> {
    Network(Bypass<'a>),
    CacheFirst,
}

/// Only complete same-origin or CORS responses are worth keeping
pub fn is_cacheable<R: ScopeResponse>(response: &R) -> bool {
    response.status() == 200 && matches!(response.kind(), ResponseKind::Basic | ResponseKind::Cors)
}

/// Handles the install, activate, fetch and message events of one worker
/// version.
///
/// Owns the version's immutable [WorkerConfig]; the two cache names in it
/// are the only partitions that survive activation.
pub struct CacheController<S> {
    config: WorkerConfig,
    scope: S,
    state: Cell<Option<WorkerState>>,
}

impl<S: WorkerScope> CacheController<S> {
    pub fn new(config: WorkerConfig, scope: S) -> Result<Self, WorkerError> {
        config.validate()?;
        Ok(Self {
            config,
            scope,
            state: Cell::new(None),
        })
    }

    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    pub fn scope(&self) -> &S {
        &self.scope
    }

    /// The last lifecycle phase this instance drove. `None` when it has only
    /// seen fetch or message events, e.g. after the browser restarted an
    /// already active worker.
    pub fn state(&self) -> Option<WorkerState> {
        self.state.get()
    }

    /// Precaches the manifest into the static partition, then skips waiting.
    ///
    /// All or nothing: one failed resource fails the install, which the
    /// browser treats as this version never having been installed. A refused
    /// skip waiting only leaves the version waiting, so it is logged.
    pub async fn install(&self) -> Result<(), WorkerError> {
        self.state.set(Some(WorkerState::Installing));
        info!(version = self.config.version(), "installing");

        if let Err(e) = self.precache().await {
            error!("install failed: {e}");
            self.state.set(Some(WorkerState::Redundant));
            return Err(e);
        }
        self.state.set(Some(WorkerState::Installed));

        if let Err(e) = self.scope.skip_waiting().await {
            warn!("{}", WorkerError::SkipWaiting(e));
        }
        Ok(())
    }

    async fn precache(&self) -> Result<(), WorkerError> {
        let cache = &self.config.caches.static_cache;
        debug!(%cache, count = self.config.precache.len(), "caching core files");

        self.scope
            .cache_add_all(cache, &self.config.precache)
            .await
            .map_err(|source| WorkerError::Precache {
                cache: cache.clone(),
                source,
            })?;
        info!(%cache, "core files cached");
        Ok(())
    }

    /// Deletes stale partitions and claims the open clients, then tells every
    /// client to go. Returns the names of the deleted partitions.
    ///
    /// `GO` is only sent once both the cleanup and the claim have finished.
    pub async fn activate(&self) -> Result<Vec<String>, WorkerError> {
        self.state.set(Some(WorkerState::Activating));
        info!(version = self.config.version(), "activating");

        let claim = async { self.scope.claim_clients().await.map_err(WorkerError::Claim) };
        let (deleted, ()) = try_join!(self.remove_stale_caches(), claim).map_err(|e| {
            error!("activation failed: {e}");
            e
        })?;

        self.state.set(Some(WorkerState::Activated));
        info!(deleted = deleted.len(), "activation complete, sending GO");
        self.notify_clients(&ClientMessage::Go).await;

        Ok(deleted)
    }

    async fn remove_stale_caches(&self) -> Result<Vec<String>, WorkerError> {
        let names = self.scope.cache_names().await.map_err(WorkerError::Cleanup)?;
        let stale: Vec<String> = names
            .into_iter()
            .filter(|name| !self.config.caches.is_live(name))
            .collect();

        try_join_all(stale.iter().map(|name| async move {
            info!(cache = %name, "deleting old cache");
            self.scope.cache_delete(name).await
        }))
        .await
        .map_err(WorkerError::Cleanup)?;

        Ok(stale)
    }

    async fn notify_clients(&self, message: &ClientMessage) {
        match self.scope.post_to_clients(message).await {
            Ok(count) => debug!(clients = count, "sent {message:?}"),
            Err(e) => error!("sending {message:?} failed: {e}"),
        }
    }

    /// Decides how a request is served without touching the caches
    pub fn route(&self, request: &S::Request) -> Route<'_> {
        let method = request.method();
        if method != "GET" {
            return Route::Network(Bypass::Method(method));
        }

        match self.config.skip.first_match(&request.url()) {
            Some(rule) => Route::Network(Bypass::Rule(rule)),
            None => Route::CacheFirst,
        }
    }

    /// Serves an intercepted request: cache first, network on a miss.
    ///
    /// Valid network responses are copied into the dynamic partition in the
    /// background; the response is returned without waiting for the write. A failed navigation falls back to the precached offline page;
    /// any other failure is returned to the page.
    pub async fn fetch(&self, request: S::Request) -> Result<S::Response, WorkerError> {
        let url = request.url();

        if let Route::Network(reason) = self.route(&request) {
            debug!(%url, "network only ({reason})");
            return self
                .scope
                .fetch(&request)
                .await
                .map_err(|source| WorkerError::Fetch { url, source });
        }

        let cached = self
            .scope
            .cache_match(&request)
            .await
            .map_err(|source| WorkerError::Lookup {
                url: url.clone(),
                source,
            })?;
        if let Some(response) = cached {
            debug!(%url, "serving from cache");
            return Ok(response);
        }

        debug!(%url, "fetching from network");
        match self.scope.fetch(&request).await {
            Ok(response) => {
                if is_cacheable(&response) {
                    self.store_dynamic(&request, &response);
                }
                Ok(response)
            }
            Err(source) => {
                error!(%url, "network fetch failed: {source}");
                self.offline_fallback(&request, url, source).await
            }
        }
    }

    // Detached and best effort: the put reads the whole copied body, and a
    // failed write never affects the response.
    fn store_dynamic(&self, request: &S::Request, response: &S::Response) {
        let url = request.url();
        let copy = match response.try_clone() {
            Ok(copy) => copy,
            Err(e) => {
                error!("error caching resource {url}: {e}");
                return;
            }
        };

        let scope = self.scope.clone();
        let cache = self.config.caches.dynamic_cache.clone();
        let request = request.clone();
        self.scope.spawn_local(
            async move {
                match scope.cache_put(&cache, &request, copy).await {
                    Ok(()) => debug!(%cache, %url, "cached new resource"),
                    Err(e) => error!("error caching resource {url}: {e}"),
                }
            }
            .boxed_local(),
        );
    }

    async fn offline_fallback(
        &self,
        request: &S::Request,
        url: String,
        source: ScopeError,
    ) -> Result<S::Response, WorkerError> {
        if request.destination() != Destination::Document {
            return Err(WorkerError::Fetch { url, source });
        }

        let offline_page = &self.config.offline_page;
        match self.scope.cache_match_url(offline_page).await {
            Ok(Some(page)) => {
                info!(%url, "serving offline page {offline_page}");
                return Ok(page);
            }
            Ok(None) => warn!("offline page {offline_page} isn't cached"),
            Err(e) => error!("offline page lookup failed: {e}"),
        }

        Err(WorkerError::OfflinePageMissing {
            url,
            offline_page: offline_page.clone(),
            source,
        })
    }

    /// Handles a control message from a page, returning the reply to post
    /// back if the message expects one
    pub async fn message(
        &self,
        message: ControlMessage,
    ) -> Result<Option<VersionReply>, WorkerError> {
        debug!("message received: {message:?}");
        match message {
            ControlMessage::SkipWaiting => {
                self.scope.skip_waiting().await.map_err(WorkerError::SkipWaiting)?;
                Ok(None)
            }
            ControlMessage::GetVersion => Ok(Some(VersionReply {
                version: self.config.version().to_string(),
            })),
        }
    }
}
