use std::{cell::OnceCell, rc::Rc};

use console_error_panic_hook::set_once as set_panic_hook;
use gloo::utils::format::JsValueSerdeExt;
use shared::{
    utils::tracing::configure_tracing_once as configure_tracing, ControlMessage, WorkerConfig,
};
use tracing::{debug, error, warn};
use wasm_bindgen::{prelude::wasm_bindgen, JsValue};
use wasm_bindgen_futures::future_to_promise;
use web_sys::{
    js_sys::Promise, ExtendableMessageEvent, MessagePort, Request, ServiceWorkerGlobalScope,
};

mod browser;
mod controller;
mod errors;
#[cfg(test)]
mod mock;
mod scope;

pub use browser::BrowserScope;
pub use controller::*;
pub use errors::*;
pub use scope::*;


thread_local! {
    static CONTROLLER: OnceCell<Rc<CacheController<BrowserScope>>> = const { OnceCell::new() };
}

/// The controller for this worker instance, built on the first event
fn controller(sw: ServiceWorkerGlobalScope) -> Result<Rc<CacheController<BrowserScope>>, JsValue> {
    set_panic_hook();
    configure_tracing();

    CONTROLLER.with(|cell| {
        if let Some(controller) = cell.get() {
            return Ok(controller.clone());
        }
        let controller = Rc::new(CacheController::new(
            WorkerConfig::default(),
            BrowserScope::new(sw),
        )?);
        let _ = cell.set(controller.clone());
        Ok(controller)
    })
}

/// Install listener body. The returned promise goes to `event.waitUntil` and
/// rejects if any precached resource couldn't be stored.
#[wasm_bindgen]
pub fn worker_install(sw: ServiceWorkerGlobalScope) -> Result<Promise, JsValue> {
    let controller = controller(sw)?;

    Ok(future_to_promise(async move {
        controller.install().await?;
        Ok(JsValue::undefined())
    }))
}

/// Activate listener body, for `event.waitUntil`
#[wasm_bindgen]
pub fn worker_activate(sw: ServiceWorkerGlobalScope) -> Result<Promise, JsValue> {
    let controller = controller(sw)?;

    Ok(future_to_promise(async move {
        let deleted = controller.activate().await?;
        Ok(JsValue::from(deleted.len() as u32))
    }))
}

/// Fetch listener body. The listener passes the returned promise to
/// `event.respondWith`; a rejection surfaces to the page as a network error.
#[wasm_bindgen]
pub fn worker_fetch(sw: ServiceWorkerGlobalScope, request: Request) -> Result<Promise, JsValue> {
    let controller = controller(sw)?;

    Ok(future_to_promise(async move {
        let response = controller.fetch(request).await?;
        Ok(JsValue::from(response))
    }))
}

/// Message listener body
#[wasm_bindgen]
pub fn worker_message(
    sw: ServiceWorkerGlobalScope,
    event: ExtendableMessageEvent,
) -> Result<Promise, JsValue> {
    let controller = controller(sw)?;

    Ok(future_to_promise(async move {
        let data = event.data();
        let message: ControlMessage = match JsValueSerdeExt::into_serde(&data) {
            Ok(message) => message,
            Err(e) => {
                debug!("ignoring unexpected message {data:?}: {e}");
                return Ok(JsValue::undefined());
            }
        };

        let Some(reply) = controller.message(message).await? else {
            return Ok(JsValue::undefined());
        };

        let port = event.ports().get(0);
        if port.is_undefined() {
            warn!("{message:?} arrived without a reply port");
            return Ok(JsValue::undefined());
        }

        let reply = <JsValue as JsValueSerdeExt>::from_serde(&reply).map_err(|e| {
            error!("serializing {reply:?} failed: {e}");
            JsValue::from_str(&e.to_string())
        })?;
        MessagePort::from(port).post_message(&reply)?;

        Ok(JsValue::undefined())
    }))
}
