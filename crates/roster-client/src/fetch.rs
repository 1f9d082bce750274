#![forbid(unsafe_code)]

//! [`Transport`] over the browser's `window.fetch`.
//!
//! Only compiled on `wasm32` targets. A rejected fetch promise (network
//! down, CORS, aborted) becomes a [`TransportError`]; every HTTP status,
//! including errors, is returned as a response for the classifier.

use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{Request, RequestInit, Response};

use crate::transport::{HttpRequest, HttpResponse, Transport, TransportError};

/// Stateless fetch-backed transport.
#[derive(Debug, Clone, Copy, Default)]
pub struct FetchTransport;

fn js_reason(value: JsValue) -> TransportError {
    if let Some(err) = value.dyn_ref::<js_sys::Error>() {
        return TransportError::new(String::from(err.message()));
    }
    if let Some(text) = value.as_string() {
        return TransportError::new(text);
    }
    let described = js_sys::JSON::stringify(&value)
        .ok()
        .and_then(|s| s.as_string())
        .unwrap_or_else(|| "fetch failed".to_string());
    TransportError::new(described)
}

impl Transport for FetchTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let init = RequestInit::new();
        init.set_method(request.method.as_str());
        if let Some(body) = &request.body {
            init.set_body(&JsValue::from_str(body));
        }

        let req = Request::new_with_str_and_init(&request.url, &init).map_err(js_reason)?;
        let headers = req.headers();
        headers
            .set("Content-Type", "application/json")
            .map_err(js_reason)?;
        headers.set("Accept", "application/json").map_err(js_reason)?;

        let window = web_sys::window().ok_or_else(|| TransportError::new("no window"))?;
        let value = JsFuture::from(window.fetch_with_request(&req))
            .await
            .map_err(js_reason)?;
        let response: Response = value.dyn_into().map_err(js_reason)?;

        let status = response.status();
        let text = JsFuture::from(response.text().map_err(js_reason)?)
            .await
            .map_err(js_reason)?;

        Ok(HttpResponse {
            status,
            body: text.as_string().unwrap_or_default(),
        })
    }
}
