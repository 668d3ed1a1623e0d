//! In-memory [WorkerScope] for exercising the controller natively

use std::{
    cell::{Cell, RefCell},
    collections::{BTreeMap, HashMap},
    ops::Deref,
    rc::Rc,
};

use async_trait::async_trait;
use futures::future::{join_all, pending, LocalBoxFuture};
use shared::ClientMessage;

use crate::scope::{
    Destination, ResponseKind, ScopeError, ScopeRequest, ScopeResponse, WorkerScope,
};

pub const ORIGIN: &str = "https://app.test";

/// Resolves origin relative paths the way the browser does for `addAll`
pub fn absolute(url: &str) -> String {
    if url.starts_with('/') {
        format!("{ORIGIN}{url}")
    } else {
        url.to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockRequest {
    pub method: String,
    pub url: String,
    pub destination: Destination,
}

impl MockRequest {
    pub fn get(url: &str) -> Self {
        Self {
            method: "GET".to_string(),
            url: absolute(url),
            destination: Destination::Other,
        }
    }

    pub fn navigate(url: &str) -> Self {
        Self {
            destination: Destination::Document,
            ..Self::get(url)
        }
    }

    pub fn with_method(self, method: &str) -> Self {
        Self {
            method: method.to_string(),
            ..self
        }
    }
}

impl ScopeRequest for MockRequest {
    fn method(&self) -> String {
        self.method.clone()
    }

    fn url(&self) -> String {
        self.url.clone()
    }

    fn destination(&self) -> Destination {
        self.destination
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockResponse {
    pub status: u16,
    pub kind: ResponseKind,
    pub body: Vec<u8>,
}

impl MockResponse {
    pub fn ok(body: &str) -> Self {
        Self {
            status: 200,
            kind: ResponseKind::Basic,
            body: body.as_bytes().to_vec(),
        }
    }

    pub fn with_status(self, status: u16) -> Self {
        Self { status, ..self }
    }

    pub fn with_kind(self, kind: ResponseKind) -> Self {
        Self { kind, ..self }
    }
}

impl ScopeResponse for MockResponse {
    fn status(&self) -> u16 {
        self.status
    }

    fn kind(&self) -> ResponseKind {
        self.kind
    }

    fn try_clone(&self) -> Result<Self, ScopeError> {
        Ok(self.clone())
    }
}

/// Cheap handle on a [MockState]; clones see the same caches and network
#[derive(Clone, Default)]
pub struct MockScope(Rc<MockState>);

impl Deref for MockScope {
    type Target = MockState;

    fn deref(&self) -> &MockState {
        &self.0
    }
}

#[derive(Default)]
pub struct MockState {
    /// cache name -> absolute url -> response
    pub caches: RefCell<BTreeMap<String, BTreeMap<String, MockResponse>>>,
    /// Urls missing here fail like an unreachable network
    pub network: RefCell<HashMap<String, MockResponse>>,
    pub fetched: RefCell<Vec<String>>,
    /// Ordered record of lifecycle side effects
    pub events: RefCell<Vec<String>>,
    pub skip_waiting_calls: Cell<usize>,
    pub clients: Cell<usize>,
    pub posted: RefCell<Vec<ClientMessage>>,
    /// Tasks handed to `spawn_local`, not yet run
    pub background: RefCell<Vec<LocalBoxFuture<'static, ()>>>,
    pub fail_puts: Cell<bool>,
    /// Puts never complete, like a write reading an endless body
    pub hang_puts: Cell<bool>,
    pub fail_claim: Cell<bool>,
    pub fail_delete: Cell<bool>,
    pub fail_match: Cell<bool>,
    pub fail_skip_waiting: Cell<bool>,
}

impl MockState {
    pub fn serve(&self, url: &str, response: MockResponse) {
        self.network.borrow_mut().insert(absolute(url), response);
    }

    pub fn go_offline(&self) {
        self.network.borrow_mut().clear();
    }

    pub fn insert(&self, cache: &str, url: &str, response: MockResponse) {
        self.caches
            .borrow_mut()
            .entry(cache.to_string())
            .or_default()
            .insert(absolute(url), response);
    }

    pub fn cached(&self, cache: &str, url: &str) -> Option<MockResponse> {
        self.caches.borrow().get(cache)?.get(&absolute(url)).cloned()
    }

    pub fn cache_names_now(&self) -> Vec<String> {
        self.caches.borrow().keys().cloned().collect()
    }

    pub fn fetch_count(&self) -> usize {
        self.fetched.borrow().len()
    }

    /// Runs every task spawned so far to completion
    pub async fn run_background(&self) {
        let tasks: Vec<_> = self.background.borrow_mut().drain(..).collect();
        join_all(tasks).await;
    }

    fn record(&self, event: String) {
        self.events.borrow_mut().push(event);
    }
}

#[async_trait(?Send)]
impl WorkerScope for MockScope {
    type Request = MockRequest;
    type Response = MockResponse;

    async fn cache_add_all(&self, cache: &str, urls: &[String]) -> Result<(), ScopeError> {
        // Opening creates the partition even if the bulk add fails
        self.caches.borrow_mut().entry(cache.to_string()).or_default();

        let mut fetched = Vec::with_capacity(urls.len());
        for url in urls {
            let response = self.fetch(&MockRequest::get(url)).await?;
            if !(200..300).contains(&response.status) {
                return Err(ScopeError::cache(
                    "add_all",
                    format!("{url} responded with {}", response.status),
                ));
            }
            fetched.push((absolute(url), response));
        }

        self.caches
            .borrow_mut()
            .entry(cache.to_string())
            .or_default()
            .extend(fetched);
        Ok(())
    }

    async fn cache_names(&self) -> Result<Vec<String>, ScopeError> {
        Ok(self.cache_names_now())
    }

    async fn cache_delete(&self, cache: &str) -> Result<bool, ScopeError> {
        if self.fail_delete.get() {
            return Err(ScopeError::cache("delete", "UnknownError: delete failed"));
        }
        self.record(format!("delete:{cache}"));
        Ok(self.caches.borrow_mut().remove(cache).is_some())
    }

    async fn cache_match(&self, request: &MockRequest) -> Result<Option<MockResponse>, ScopeError> {
        if self.fail_match.get() {
            return Err(ScopeError::cache("match", "InvalidStateError: storage unavailable"));
        }
        self.cache_match_url(&request.url).await
    }

    async fn cache_match_url(&self, url: &str) -> Result<Option<MockResponse>, ScopeError> {
        let url = absolute(url);
        Ok(self
            .caches
            .borrow()
            .values()
            .find_map(|entries| entries.get(&url).cloned()))
    }

    async fn cache_put(
        &self,
        cache: &str,
        request: &MockRequest,
        response: MockResponse,
    ) -> Result<(), ScopeError> {
        if self.hang_puts.get() {
            pending::<()>().await;
        }
        if self.fail_puts.get() {
            return Err(ScopeError::cache("put", "QuotaExceededError: quota exceeded"));
        }
        self.insert(cache, &request.url, response);
        Ok(())
    }

    async fn fetch(&self, request: &MockRequest) -> Result<MockResponse, ScopeError> {
        self.fetched.borrow_mut().push(request.url.clone());
        self.network
            .borrow()
            .get(&request.url)
            .cloned()
            .ok_or_else(|| ScopeError::network(&request.url, "TypeError: Failed to fetch"))
    }

    async fn skip_waiting(&self) -> Result<(), ScopeError> {
        if self.fail_skip_waiting.get() {
            return Err(ScopeError::lifecycle("skip_waiting", "InvalidStateError"));
        }
        self.record("skip_waiting".to_string());
        self.skip_waiting_calls.set(self.skip_waiting_calls.get() + 1);
        Ok(())
    }

    async fn claim_clients(&self) -> Result<(), ScopeError> {
        if self.fail_claim.get() {
            return Err(ScopeError::clients("claim", "InvalidStateError"));
        }
        self.record("claim".to_string());
        Ok(())
    }

    async fn post_to_clients(&self, message: &ClientMessage) -> Result<usize, ScopeError> {
        self.record(format!("post:{message:?}"));
        self.posted.borrow_mut().push(*message);
        Ok(self.clients.get())
    }

    fn spawn_local(&self, task: LocalBoxFuture<'static, ()>) {
        self.background.borrow_mut().push(task);
    }
}
