use shared::ConfigError;
use thiserror::Error;
use wasm_bindgen::JsValue;
use web_sys::js_sys::Error as JsError;

use crate::scope::ScopeError;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkerError {
    #[error("invalid worker config: {0}")]
    Config(#[from] ConfigError),
    #[error("precaching into {cache} failed: {source}")]
    Precache { cache: String, source: ScopeError },
    #[error("skip waiting failed: {0}")]
    SkipWaiting(ScopeError),
    #[error("removing stale caches failed: {0}")]
    Cleanup(ScopeError),
    #[error("claiming clients failed: {0}")]
    Claim(ScopeError),
    #[error("cache lookup for {url} failed: {source}")]
    Lookup { url: String, source: ScopeError },
    #[error("{source}")]
    Fetch { url: String, source: ScopeError },
    #[error("{source} and the offline page {offline_page} isn't cached")]
    OfflinePageMissing {
        url: String,
        offline_page: String,
        source: ScopeError,
    },
}

impl WorkerError {
    /// True when the failure came from the network rather than the caches
    pub fn is_network(&self) -> bool {
        matches!(
            self,
            WorkerError::Fetch { .. } | WorkerError::OfflinePageMissing { .. }
        )
    }
}

// Rejected promises carry a real Error so devtools shows the message
impl From<WorkerError> for JsValue {
    fn from(err: WorkerError) -> Self {
        JsError::new(&err.to_string()).into()
    }
}
