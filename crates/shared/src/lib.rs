use const_format::concatcp;

pub mod api;
pub mod config;
pub mod messages;
pub mod skip;
pub mod utils;

pub use config::*;
pub use messages::*;
pub use skip::*;

#[cfg(feature = "backend")]
pub use utils::native::*;

/// Name of the cache partition holding the precached application shell.
/// Bumping it is what invalidates the shell across deployments.
pub const STATIC_CACHE_NAME: &str = "pwa-cache-v12";

/// Name of the cache partition filled lazily from network responses
pub const DYNAMIC_CACHE_NAME: &str = "pwa-dynamic-v1";

/// Page served for document navigations that fail while offline
pub const OFFLINE_PAGE: &str = "/offline.html";

/// Resources fetched and stored at install time, in order
pub const PRECACHE_MANIFEST: &[&str] = &[
    "/",
    "/index.html",
    "/style.css",
    "/script.js",
    "/layerscript.js",
    "/apple-touch-icon.png",
    "/icon-512.png",
    "/loading.webp",
    "/favicon.ico",
    OFFLINE_PAGE,
];

/// The loader script registered by the page. It has to live at the root so
/// the worker's default scope covers the whole origin.
pub const SERVICE_WORKER_URL: &str = "/sw.js";

pub const WASM_BASE_PATH: &str = "/wasm/";

/// Generated bindings the loader imports. The worker's wasm is embedded in
/// them and they register the worker's event listeners.
pub const SERVICE_WORKER_BINDINGS_URL: &str = concatcp!(WASM_BASE_PATH, "service_worker.js");
