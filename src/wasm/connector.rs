//! PhantomConnector: the connector exposed to page scripts
//!
//! ```javascript
//! import init, { PhantomConnector, shortenKey } from 'phantom-link';
//!
//! await init();
//! const phantom = new PhantomConnector({ notifyOnDisconnect: false });
//! phantom.init(); // silent reconnect once the DOM is ready
//!
//! const unsubscribe = phantom.onIdentityChange(key => {
//!     button.textContent = key ? shortenKey(key) : 'Connect Phantom';
//! });
//!
//! try {
//!     const { publicKey } = await phantom.connect();
//!     const { signature } = await phantom.signMessage('hello');
//! } catch (e) {
//!     if (e.name === 'ProviderNotFound') showInstallHint();
//! }
//! ```

use js_sys::{Function, Promise, Reflect, Uint8Array};
use serde::{Deserialize, Serialize};
use std::cell::Cell;
use tracing::{debug, error, info, warn};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::{future_to_promise, spawn_local};

use super::host::BrowserHost;
use super::logging::init_logging;
use crate::config::ConnectorConfig;
use crate::connector::Connector;
use crate::core::error::ConnectorError;
use crate::core::identity::shorten_key;
use crate::core::provider::{ConnectOptions, MessageInput};

/// Provider rejections are rethrown as the provider's own value; errors
/// raised by the connector become an `Error` named after `kind()`.
pub(crate) fn js_error(err: ConnectorError) -> JsValue {
    if let Some(raw) = err.cause().and_then(|cause| cause.downcast_ref::<JsValue>()) {
        return raw.clone();
    }
    let error = js_sys::Error::new(&err.to_string());
    error.set_name(err.kind());
    error.into()
}

fn from_js<T: for<'de> Deserialize<'de> + Default>(value: JsValue) -> Result<T, JsValue> {
    if value.is_null() || value.is_undefined() {
        return Ok(T::default());
    }
    serde_wasm_bindgen::from_value(value).map_err(|err| JsValue::from_str(&err.to_string()))
}

fn to_js<T: Serialize>(value: &T) -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(value).map_err(|err| JsValue::from_str(&err.to_string()))
}

/// Abbreviate a public key for display (`ABCD…WXYZ`).
#[wasm_bindgen(js_name = "shortenKey")]
pub fn shorten_key_js(key: &str) -> String {
    shorten_key(key)
}

#[wasm_bindgen]
pub struct PhantomConnector {
    connector: Connector<BrowserHost>,
    initialized: Cell<bool>,
}

#[wasm_bindgen]
impl PhantomConnector {
    /// Create a connector. `config` is optional; missing fields take defaults.
    #[wasm_bindgen(constructor)]
    pub fn new(config: JsValue) -> Result<PhantomConnector, JsValue> {
        let config: ConnectorConfig = from_js(config)?;
        init_logging(&config.log_level);
        let host = BrowserHost::new(&config);
        info!("PhantomConnector loaded");
        Ok(Self { connector: Connector::new(host, config), initialized: Cell::new(false) })
    }

    /// Run detection and the silent reconnect once the DOM is ready.
    /// Only the first call schedules anything; returns whether this one did.
    pub fn init(&self) -> bool {
        if self.initialized.replace(true) {
            debug!("init already scheduled");
            return false;
        }
        let connector = self.connector.clone();
        let run = move || {
            spawn_local(async move {
                let _ = connector.init().await;
            })
        };

        let document = web_sys::window().and_then(|w| w.document());
        let loading = document
            .as_ref()
            .and_then(|d| Reflect::get(d, &JsValue::from_str("readyState")).ok())
            .and_then(|state| state.as_string())
            .is_some_and(|state| state == "loading");

        match document {
            Some(document) if loading => {
                let on_ready = Closure::once_into_js(run);
                if let Err(err) = document.add_event_listener_with_callback("DOMContentLoaded", on_ready.unchecked_ref()) {
                    warn!(?err, "could not wait for DOMContentLoaded");
                }
            }
            _ => run(),
        }
        true
    }

    /// The provider object, or `null`.
    #[wasm_bindgen(js_name = "detectProvider")]
    pub fn detect_provider(&self) -> JsValue {
        self.connector
            .detect_provider()
            .map(|provider| provider.object().clone())
            .unwrap_or(JsValue::NULL)
    }

    /// Resolves `{ publicKey }`. Rejects with a `ProviderNotFound` error (after
    /// opening the install page) or with the provider's own rejection.
    pub fn connect(&self, options: JsValue) -> Promise {
        let connector = self.connector.clone();
        future_to_promise(async move {
            let options: ConnectOptions = from_js(options)?;
            let connection = connector.connect(options).await.map_err(js_error)?;
            to_js(&connection)
        })
    }

    /// Resolves once the provider call settles. Never rejects.
    pub fn disconnect(&self) -> Promise {
        let connector = self.connector.clone();
        future_to_promise(async move {
            let _ = connector.disconnect().await;
            Ok(JsValue::UNDEFINED)
        })
    }

    #[wasm_bindgen(js_name = "isConnected")]
    pub fn is_connected(&self) -> bool {
        self.connector.is_connected()
    }

    #[wasm_bindgen(js_name = "getPublicKey")]
    pub fn public_key(&self) -> Option<String> {
        self.connector.identity().map(|identity| identity.into_string())
    }

    /// `"unknown"`, `"disconnected"` or `"connected"`.
    pub fn status(&self) -> String {
        self.connector.status().as_str().to_string()
    }

    /// Sign a string (UTF-8 encoded) or a `Uint8Array`.
    /// Resolves with the provider's response, unmodified.
    #[wasm_bindgen(js_name = "signMessage")]
    pub fn sign_message(&self, message: JsValue) -> Promise {
        let input = if let Some(text) = message.as_string() {
            MessageInput::Text(text)
        } else if let Some(bytes) = message.dyn_ref::<Uint8Array>() {
            MessageInput::Bytes(bytes.to_vec())
        } else {
            let err = js_sys::TypeError::new("message must be a string or Uint8Array");
            return Promise::reject(&err.into());
        };

        let connector = self.connector.clone();
        future_to_promise(async move {
            connector.sign_message(input).await.map_err(js_error)
        })
    }

    /// Hand a caller-built transaction to the provider; resolves with whatever
    /// the provider returns.
    #[wasm_bindgen(js_name = "signTransaction")]
    pub fn sign_transaction(&self, transaction: JsValue) -> Promise {
        let connector = self.connector.clone();
        future_to_promise(async move {
            connector.sign_transaction(transaction).await.map_err(js_error)
        })
    }

    /// Call `callback(publicKey | null)` now and on every identity change.
    /// Returns the unsubscribe function.
    #[wasm_bindgen(js_name = "onIdentityChange")]
    pub fn on_identity_change(&self, callback: Function) -> Function {
        let subscription = self.connector.on_identity_change(move |identity| {
            let arg = identity
                .map(|id| JsValue::from_str(id.as_str()))
                .unwrap_or(JsValue::NULL);
            if let Err(err) = callback.call1(&JsValue::NULL, &arg) {
                error!(?err, "identity observer threw");
            }
        });

        let mut slot = Some(subscription);
        let unsubscribe = Closure::wrap(Box::new(move || {
            if let Some(subscription) = slot.take() {
                subscription.unsubscribe();
            }
        }) as Box<dyn FnMut()>);
        unsubscribe.into_js_value().unchecked_into()
    }
}
