use async_trait::async_trait;
use futures::future::LocalBoxFuture;
use gloo::utils::format::JsValueSerdeExt;
use shared::{utils::JsError, ClientMessage};
use tracing::warn;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::{spawn_local, JsFuture};
use web_sys::{
    js_sys::Array, Cache, CacheStorage, Client, Request, RequestDestination, Response,
    ResponseType, ServiceWorkerGlobalScope,
};

use crate::scope::{
    Destination, ResponseKind, ScopeError, ScopeRequest, ScopeResponse, WorkerScope,
};

fn describe(value: JsValue) -> String {
    JsError::from(value).to_string()
}

impl ScopeRequest for Request {
    fn method(&self) -> String {
        Request::method(self)
    }

    fn url(&self) -> String {
        Request::url(self)
    }

    fn destination(&self) -> Destination {
        match Request::destination(self) {
            RequestDestination::Document => Destination::Document,
            _ => Destination::Other,
        }
    }
}

impl ScopeResponse for Response {
    fn status(&self) -> u16 {
        Response::status(self)
    }

    fn kind(&self) -> ResponseKind {
        match self.type_() {
            ResponseType::Basic => ResponseKind::Basic,
            ResponseType::Cors => ResponseKind::Cors,
            ResponseType::Default => ResponseKind::Default,
            ResponseType::Opaque => ResponseKind::Opaque,
            ResponseType::Opaqueredirect => ResponseKind::OpaqueRedirect,
            _ => ResponseKind::Error,
        }
    }

    fn try_clone(&self) -> Result<Self, ScopeError> {
        Response::clone(self).map_err(|e| ScopeError::cache("response::clone", describe(e)))
    }
}

/// `caches.match` resolves to undefined on a miss
fn cached_response(value: JsValue, operation: &'static str) -> Result<Option<Response>, ScopeError> {
    if value.is_instance_of::<Response>() {
        Ok(Some(value.unchecked_into()))
    } else if value.is_undefined() {
        Ok(None)
    } else {
        Err(ScopeError::cache(
            operation,
            format!("resolved to something other than a Response or undefined: {value:?}"),
        ))
    }
}

/// [WorkerScope] over the real `ServiceWorkerGlobalScope`
#[derive(Debug, Clone)]
pub struct BrowserScope {
    sw: ServiceWorkerGlobalScope,
}

impl BrowserScope {
    pub fn new(sw: ServiceWorkerGlobalScope) -> Self {
        Self { sw }
    }

    fn caches(&self) -> Result<CacheStorage, ScopeError> {
        self.sw.caches().map_err(|e| ScopeError::cache("caches", describe(e)))
    }

    async fn open(&self, name: &str) -> Result<Cache, ScopeError> {
        let cache = JsFuture::from(self.caches()?.open(name))
            .await
            .map_err(|e| ScopeError::cache("open", describe(e)))?;
        Ok(cache.unchecked_into())
    }
}

#[async_trait(?Send)]
impl WorkerScope for BrowserScope {
    type Request = Request;
    type Response = Response;

    async fn cache_add_all(&self, cache: &str, urls: &[String]) -> Result<(), ScopeError> {
        let cache = self.open(cache).await?;
        let urls: Array = urls.iter().map(|url| JsValue::from_str(url)).collect();

        JsFuture::from(cache.add_all_with_str_sequence(&urls))
            .await
            .map_err(|e| ScopeError::cache("add_all", describe(e)))?;
        Ok(())
    }

    async fn cache_names(&self) -> Result<Vec<String>, ScopeError> {
        let keys: Array = JsFuture::from(self.caches()?.keys())
            .await
            .map_err(|e| ScopeError::cache("keys", describe(e)))?
            .unchecked_into();

        Ok(keys.iter().filter_map(|key| key.as_string()).collect())
    }

    async fn cache_delete(&self, cache: &str) -> Result<bool, ScopeError> {
        let deleted = JsFuture::from(self.caches()?.delete(cache))
            .await
            .map_err(|e| ScopeError::cache("delete", describe(e)))?;
        Ok(deleted.as_bool().unwrap_or(false))
    }

    async fn cache_match(&self, request: &Request) -> Result<Option<Response>, ScopeError> {
        let value = JsFuture::from(self.caches()?.match_with_request(request))
            .await
            .map_err(|e| ScopeError::cache("match", describe(e)))?;
        cached_response(value, "match")
    }

    async fn cache_match_url(&self, url: &str) -> Result<Option<Response>, ScopeError> {
        let value = JsFuture::from(self.caches()?.match_with_str(url))
            .await
            .map_err(|e| ScopeError::cache("match", describe(e)))?;
        cached_response(value, "match")
    }

    async fn cache_put(
        &self,
        cache: &str,
        request: &Request,
        response: Response,
    ) -> Result<(), ScopeError> {
        let cache = self.open(cache).await?;
        JsFuture::from(cache.put_with_request(request, &response))
            .await
            .map_err(|e| ScopeError::cache("put", describe(e)))?;
        Ok(())
    }

    async fn fetch(&self, request: &Request) -> Result<Response, ScopeError> {
        let url = request.url();
        let response = JsFuture::from(self.sw.fetch_with_request(request))
            .await
            .map_err(|e| ScopeError::network(&url, describe(e)))?;

        if response.is_instance_of::<Response>() {
            Ok(response.unchecked_into())
        } else {
            Err(ScopeError::network(
                url,
                format!("fetch returned something other than a Response: {response:?}"),
            ))
        }
    }

    async fn skip_waiting(&self) -> Result<(), ScopeError> {
        let promise = self
            .sw
            .skip_waiting()
            .map_err(|e| ScopeError::lifecycle("skip_waiting", describe(e)))?;
        JsFuture::from(promise)
            .await
            .map_err(|e| ScopeError::lifecycle("skip_waiting", describe(e)))?;
        Ok(())
    }

    async fn claim_clients(&self) -> Result<(), ScopeError> {
        JsFuture::from(self.sw.clients().claim())
            .await
            .map_err(|e| ScopeError::clients("claim", describe(e)))?;
        Ok(())
    }

    async fn post_to_clients(&self, message: &ClientMessage) -> Result<usize, ScopeError> {
        let payload = <JsValue as JsValueSerdeExt>::from_serde(message)
            .map_err(|e| ScopeError::clients("post_message", e))?;
        let clients: Array = JsFuture::from(self.sw.clients().match_all())
            .await
            .map_err(|e| ScopeError::clients("match_all", describe(e)))?
            .unchecked_into();

        let mut sent = 0;
        for client in clients.iter().map(|c| c.unchecked_into::<Client>()) {
            match client.post_message(&payload) {
                Ok(()) => sent += 1,
                Err(e) => warn!("post_message to {} failed: {}", client.url(), describe(e)),
            }
        }
        Ok(sent)
    }

    fn spawn_local(&self, task: LocalBoxFuture<'static, ()>) {
        spawn_local(task);
    }
}
