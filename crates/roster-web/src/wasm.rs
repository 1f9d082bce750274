#![forbid(unsafe_code)]

//! `wasm-bindgen` exports for the customer table.
//!
//! This module wraps [`super::shell_core::ShellCore`] with JS-friendly types.
//! Only compiled on `wasm32` targets.

use js_sys::{JSON, Promise};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::future_to_promise;

use roster_client::{FetchTransport, HttpCollectionClient};
use roster_core::Config;

use super::shell_core::{ShellCore, ShellError, parse_id};

type Client = HttpCollectionClient<FetchTransport>;

fn console_error(msg: &str) {
    let global = js_sys::global();
    let Ok(console) = js_sys::Reflect::get(&global, &"console".into()) else {
        return;
    };
    let Ok(error) = js_sys::Reflect::get(&console, &"error".into()) else {
        return;
    };
    let Ok(error_fn) = error.dyn_into::<js_sys::Function>() else {
        return;
    };
    let _ = error_fn.call1(&console, &JsValue::from_str(msg));
}

fn install_panic_hook() {
    use std::sync::Once;

    static ONCE: Once = Once::new();
    ONCE.call_once(|| {
        std::panic::set_hook(Box::new(|info| {
            let msg = if let Some(loc) = info.location() {
                format!(
                    "panic at {}:{}:{}: {info}",
                    loc.file(),
                    loc.line(),
                    loc.column()
                )
            } else {
                format!("panic: {info}")
            };
            console_error(&msg);
        }));
    });
}

/// Parse JSON produced by this crate into a JS value (`null` on failure).
fn json_value(text: &str) -> JsValue {
    JSON::parse(text).unwrap_or(JsValue::NULL)
}

fn reject(err: ShellError) -> JsValue {
    JsValue::from_str(&err.user_message())
}

fn record_id(id: f64) -> Result<RecordId, Promise> {
    parse_id(id).map_err(|err| Promise::reject(&reject(err)))
}

/// Customer table controller for the host page.
///
/// Writes and loads return Promises that resolve once the collection has
/// been refreshed; rejections carry an operator-facing message. Notices
/// (toasts) are pulled with `takeNotices()`.
#[wasm_bindgen]
pub struct RosterApp {
    inner: ShellCore<Client>,
}

#[wasm_bindgen(start)]
pub fn wasm_start() {
    install_panic_hook();
}

#[wasm_bindgen]
impl RosterApp {
    /// Create an app talking to the service at `base_url`.
    #[wasm_bindgen(constructor)]
    pub fn new(base_url: &str) -> Self {
        install_panic_hook();
        let config = Config::with_base_url(base_url);
        let client = HttpCollectionClient::new(config.base_url.clone(), FetchTransport);
        Self {
            inner: ShellCore::new(client, &config),
        }
    }

    /// Load the collection (cached while fresh). Resolves to the row count.
    pub fn load(&self) -> Promise {
        let fut = self.inner.load();
        future_to_promise(async move {
            let collection = fut.await.map_err(reject)?;
            Ok(JsValue::from_f64(collection.len() as f64))
        })
    }

    /// Refetch unconditionally. Resolves to the row count.
    pub fn refresh(&self) -> Promise {
        let fut = self.inner.refresh();
        future_to_promise(async move {
            let collection = fut.await.map_err(reject)?;
            Ok(JsValue::from_f64(collection.len() as f64))
        })
    }

    /// Validate and create a customer from a JSON draft. Resolves to the
    /// saved record.
    pub fn create(&self, json: &str) -> Promise {
        let fut = self.inner.create(json);
        future_to_promise(async move {
            let saved = fut.await.map_err(reject)?;
            Ok(json_value(&serde_json::to_string(&saved).unwrap_or_default()))
        })
    }

    /// Validate and update customer `id`. Resolves to the saved record.
    pub fn update(&self, id: f64, json: &str) -> Promise {
        let id = match record_id(id) {
            Ok(id) => id,
            Err(rejected) => return rejected,
        };
        let fut = self.inner.update(id, json);
        future_to_promise(async move {
            let saved = fut.await.map_err(reject)?;
            Ok(json_value(&serde_json::to_string(&saved).unwrap_or_default()))
        })
    }

    /// Delete customer `id`. Resolves to `undefined`. Ids that are not whole
    /// numbers reject without a request.
    pub fn remove(&self, id: f64) -> Promise {
        let id = match record_id(id) {
            Ok(id) => id,
            Err(rejected) => return rejected,
        };
        let fut = self.inner.remove(id);
        future_to_promise(async move {
            fut.await.map_err(reject)?;
            Ok(JsValue::UNDEFINED)
        })
    }

    /// Read one customer straight from the service.
    #[wasm_bindgen(js_name = fetchOne)]
    pub fn fetch_one(&self, id: f64) -> Promise {
        let id = match record_id(id) {
            Ok(id) => id,
            Err(rejected) => return rejected,
        };
        let fut = self.inner.coordinator().fetch_one(id);
        future_to_promise(async move {
            let record = fut.await.map_err(|err| reject(err.into()))?;
            Ok(json_value(&serde_json::to_string(&record).unwrap_or_default()))
        })
    }

    /// Report scroll position and viewport height (pixels).
    /// Returns `true` if the host should redraw.
    #[wasm_bindgen(js_name = setViewport)]
    pub fn set_viewport(&self, scroll_offset: f64, viewport_height: f64) -> bool {
        self.inner.set_viewport(scroll_offset, viewport_height)
    }

    /// Rows to draw: `Array<{ index, top, height, record }>`.
    #[wasm_bindgen(js_name = visibleRows)]
    pub fn visible_rows(&self) -> JsValue {
        json_value(&self.inner.visible_rows_json())
    }

    /// Height of the scroll placeholder in pixels.
    #[wasm_bindgen(js_name = totalSize)]
    pub fn total_size(&self) -> f64 {
        self.inner.total_size()
    }

    /// Check a JSON draft: `{ valid, errors: Array<{ field, message }> }`.
    pub fn validate(&self, json: &str) -> JsValue {
        json_value(&self.inner.validate_json(json))
    }

    /// Drain notices: `Array<{ level, message, detail }>`.
    #[wasm_bindgen(js_name = takeNotices)]
    pub fn take_notices(&self) -> JsValue {
        json_value(&self.inner.take_notices_json())
    }

    /// `"idle" | "loading" | "error" | "success"`.
    pub fn status(&self) -> String {
        self.inner.status().to_string()
    }

    /// Whether a write is still in flight.
    #[wasm_bindgen(js_name = isMutating)]
    pub fn is_mutating(&self) -> bool {
        self.inner.is_mutating()
    }
}
