//! BrowserHost: locates the provider on `window`

use js_sys::Reflect;
use std::rc::Rc;
use tracing::warn;
use wasm_bindgen::JsValue;

use super::provider::JsProvider;
use crate::config::ConnectorConfig;
use crate::core::provider::{HandleCache, ProviderHost};

pub struct BrowserHost {
    provider_global: String,
    vendor_flag: String,
    // Not cleared when the provider vanishes: if the same object returns it
    // must map to the same handle, or its listener would be attached twice.
    handles: HandleCache<JsProvider>,
}

impl BrowserHost {
    pub fn new(config: &ConnectorConfig) -> Self {
        Self {
            provider_global: config.provider_global.clone(),
            vendor_flag: config.vendor_flag.clone(),
            handles: HandleCache::new(),
        }
    }
}

impl ProviderHost for BrowserHost {
    type Provider = JsProvider;

    fn locate(&self) -> Option<Rc<JsProvider>> {
        let window = web_sys::window()?;
        let object = Reflect::get(&window, &JsValue::from_str(&self.provider_global)).ok()?;
        if object.is_undefined() || object.is_null() {
            return None;
        }

        let flagged = Reflect::get(&object, &JsValue::from_str(&self.vendor_flag))
            .map(|flag| flag.is_truthy())
            .unwrap_or(false);
        if !flagged {
            return None;
        }

        Some(self.handles.resolve(object, |cached, object| cached.is_same_object(object), JsProvider::new))
    }

    fn open_install_page(&self, url: &str) {
        let Some(window) = web_sys::window() else {
            return;
        };
        if let Err(err) = window.open_with_url_and_target(url, "_blank") {
            warn!(?err, %url, "could not open install page");
        }
    }

    fn is_secure_context(&self) -> bool {
        web_sys::window().map(|w| w.is_secure_context()).unwrap_or(false)
    }
}
