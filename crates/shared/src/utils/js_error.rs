use thiserror::Error;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::js_sys::{Error as GenericJsError, RangeError, TypeError};

/// A thrown or rejected JS value, classified so it can be logged and matched
/// on from Rust.
///
/// `fetch` rejects with a `TypeError` on network failure and `Cache.addAll`
/// does the same when any response isn't ok. Quota and state problems arrive
/// as `DOMException`s which land in `Other` with their name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JsError {
    #[error("TypeError: {0}")]
    Type(String),
    #[error("RangeError: {0}")]
    Range(String),
    #[error("{name}: {message}")]
    Other { name: String, message: String },
    #[error("non-Error value: {0}")]
    NonError(String),
}

impl From<JsValue> for JsError {
    fn from(value: JsValue) -> Self {
        if value.is_instance_of::<TypeError>() {
            let err: &GenericJsError = value.unchecked_ref();
            return JsError::Type(err.message().into());
        }
        if value.is_instance_of::<RangeError>() {
            let err: &GenericJsError = value.unchecked_ref();
            return JsError::Range(err.message().into());
        }
        if let Some(err) = value.dyn_ref::<GenericJsError>() {
            return JsError::Other {
                name: err.name().into(),
                message: err.message().into(),
            };
        }
        match value.as_string() {
            Some(s) => JsError::NonError(s),
            None => JsError::NonError(format!("{value:?}")),
        }
    }
}
