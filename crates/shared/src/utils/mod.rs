#[cfg(feature = "wasm")]
mod js_error;
#[cfg(feature = "wasm")]
pub use js_error::*;

#[cfg(feature = "wasm")]
pub mod tracing;

#[cfg(feature = "backend")]
pub mod native;
