//! JsProvider: the injected `window.solana` object behind `WalletProvider`
//!
//! Every capability is looked up on the object at call time, so a provider
//! that loses a method mid-session fails that call with a provider error
//! instead of taking the page down.

use async_trait::async_trait;
use js_sys::{Array, Function, Object, Promise, Reflect, Uint8Array};
use std::cell::RefCell;
use tracing::{debug, warn};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;

use crate::core::error::{ConnectorError, ConnectorResult, RawCause};
use crate::core::identity::Identity;
use crate::core::provider::{AccountChangedHandler, ConnectOptions, ConnectResponse, WalletProvider};

const ACCOUNT_CHANGED: &str = "accountChanged";

pub struct JsProvider {
    object: JsValue,
    // Kept alive for as long as the provider may call back into them.
    listeners: RefCell<Vec<Closure<dyn FnMut(JsValue)>>>,
}

impl JsProvider {
    pub fn new(object: JsValue) -> Self {
        Self { object, listeners: RefCell::new(Vec::new()) }
    }

    /// The raw provider object, as found on `window`.
    pub fn object(&self) -> &JsValue {
        &self.object
    }

    pub fn is_same_object(&self, other: &JsValue) -> bool {
        Object::is(&self.object, other)
    }

    fn property(&self, name: &str) -> JsValue {
        Reflect::get(&self.object, &JsValue::from_str(name)).unwrap_or(JsValue::UNDEFINED)
    }

    fn method(&self, name: &str) -> ConnectorResult<Function> {
        self.property(name)
            .dyn_into::<Function>()
            .map_err(|_| ConnectorError::provider(format!("provider has no {name}() method")))
    }

    /// Call `name` on the provider object, awaiting the result if it is a promise.
    async fn call(&self, name: &str, args: &[JsValue]) -> ConnectorResult<JsValue> {
        let function = self.method(name)?;
        let args = Array::from_iter(args.iter());
        let result = function.apply(&self.object, &args).map_err(provider_error)?;

        if result.has_type::<Promise>() {
            JsFuture::from(result.unchecked_into::<Promise>())
                .await
                .map_err(provider_error)
        } else {
            Ok(result)
        }
    }
}

#[async_trait(?Send)]
impl WalletProvider for JsProvider {
    type Transaction = JsValue;
    type Signature = JsValue;

    async fn connect(&self, options: ConnectOptions) -> ConnectorResult<ConnectResponse> {
        let options = serde_wasm_bindgen::to_value(&options)
            .map_err(|e| ConnectorError::provider(format!("connect options: {e}")))?;
        let response = self.call("connect", &[options]).await?;
        let public_key = key_to_identity(&get(&response, "publicKey"))
            .ok_or_else(|| ConnectorError::provider("connect response has no publicKey"))?;
        Ok(ConnectResponse { public_key })
    }

    async fn disconnect(&self) -> ConnectorResult<()> {
        self.call("disconnect", &[]).await.map(|_| ())
    }

    /// Resolves with the provider's own response object.
    async fn sign_message(&self, message: Vec<u8>, encoding: &str) -> ConnectorResult<JsValue> {
        let data = Uint8Array::from(message.as_slice());
        self.call("signMessage", &[data.into(), JsValue::from_str(encoding)]).await
    }

    async fn sign_transaction(&self, transaction: JsValue) -> ConnectorResult<JsValue> {
        self.call("signTransaction", &[transaction]).await
    }

    fn is_connected(&self) -> bool {
        self.property("isConnected").as_bool().unwrap_or(false)
    }

    fn public_key(&self) -> Option<Identity> {
        key_to_identity(&self.property("publicKey"))
    }

    fn on_account_changed(&self, handler: AccountChangedHandler) {
        let Ok(on) = self.method("on") else {
            debug!("provider has no on(); account changes will not be observed");
            return;
        };
        let closure = Closure::wrap(Box::new(move |key: JsValue| {
            handler(key_to_identity(&key));
        }) as Box<dyn FnMut(JsValue)>);

        if let Err(err) = on.call2(&self.object, &JsValue::from_str(ACCOUNT_CHANGED), closure.as_ref()) {
            warn!(?err, "failed to register accountChanged listener");
            return;
        }
        self.listeners.borrow_mut().push(closure);
    }
}

fn get(target: &JsValue, key: &str) -> JsValue {
    Reflect::get(target, &JsValue::from_str(key)).unwrap_or(JsValue::UNDEFINED)
}

/// Convert a key-like JS value (string or PublicKey object) to an identity.
pub(crate) fn key_to_identity(value: &JsValue) -> Option<Identity> {
    if value.is_null() || value.is_undefined() {
        return None;
    }
    if let Some(text) = value.as_string() {
        return Some(Identity::new(text));
    }
    let text: String = value.unchecked_ref::<Object>().to_string().into();
    Some(Identity::new(text))
}

/// Classify a rejected provider call, keeping the rejection value itself.
pub(crate) fn provider_error(err: JsValue) -> ConnectorError {
    let code = Reflect::get(&err, &JsValue::from_str("code"))
        .ok()
        .and_then(|c| c.as_f64())
        .map(|c| c as i64);
    let message = Reflect::get(&err, &JsValue::from_str("message"))
        .ok()
        .and_then(|m| m.as_string())
        .or_else(|| err.as_string())
        .unwrap_or_else(|| format!("{err:?}"));

    ConnectorError::from_provider_code(code, message).with_cause(RawCause::new(err))
}

#[cfg(all(test, target_arch = "wasm32"))]
mod tests {
    use super::*;
    use wasm_bindgen_test::*;

    fn rejection(code: f64, message: &str) -> JsValue {
        let err = Object::new();
        Reflect::set(&err, &JsValue::from_str("code"), &JsValue::from_f64(code)).unwrap();
        Reflect::set(&err, &JsValue::from_str("message"), &JsValue::from_str(message)).unwrap();
        err.into()
    }

    #[wasm_bindgen_test]
    fn test_code_4001_is_user_rejection_with_raw_value_kept() {
        let raw = rejection(4001.0, "User rejected the request.");
        let err = provider_error(raw.clone());
        assert!(err.is_user_rejected());
        assert_eq!(err.to_string(), "request rejected by user: User rejected the request.");

        let kept = err.cause().and_then(|c| c.downcast_ref::<JsValue>()).unwrap();
        assert!(Object::is(kept, &raw));
    }

    #[wasm_bindgen_test]
    fn test_other_codes_and_bare_strings_are_provider_errors() {
        assert_eq!(provider_error(rejection(-32603.0, "Internal error")).kind(), "ProviderError");

        let err = provider_error(JsValue::from_str("extension crashed"));
        assert_eq!(err.kind(), "ProviderError");
        assert_eq!(err.to_string(), "provider error: extension crashed");
    }

    #[wasm_bindgen_test]
    fn test_key_to_identity_accepts_strings_and_stringifiable_objects() {
        assert_eq!(key_to_identity(&JsValue::NULL), None);
        assert_eq!(key_to_identity(&JsValue::UNDEFINED), None);
        assert_eq!(key_to_identity(&JsValue::from_str("Addr1234")), Some(Identity::new("Addr1234")));

        let to_string = Function::new_no_args("return 'Addr5678';");
        let key = Object::new();
        Reflect::set(&key, &JsValue::from_str("toString"), &to_string).unwrap();
        assert_eq!(key_to_identity(&key.into()), Some(Identity::new("Addr5678")));
    }

    #[wasm_bindgen_test]
    async fn test_sign_message_resolves_with_provider_response_untouched() {
        let sign = Function::new_with_args(
            "message, encoding",
            "return Promise.resolve({ signature: message, publicKey: { toString() { return 'Addr1234'; } }, encoding });",
        );
        let object = Object::new();
        Reflect::set(&object, &JsValue::from_str("signMessage"), &sign).unwrap();

        let response = JsProvider::new(object.into()).sign_message(vec![1, 2, 3], "utf8").await.unwrap();
        assert_eq!(get(&response, "encoding").as_string().as_deref(), Some("utf8"));
        assert!(get(&response, "publicKey").is_object());
        assert_eq!(get(&response, "signature").dyn_into::<Uint8Array>().unwrap().to_vec(), vec![1, 2, 3]);
    }

    #[wasm_bindgen_test]
    fn test_handle_is_reused_only_for_the_same_object() {
        use crate::core::provider::HandleCache;
        use std::rc::Rc;

        let cache = HandleCache::new();
        let object: JsValue = Object::new().into();
        let same = |cached: &JsProvider, object: &JsValue| cached.is_same_object(object);

        let first = cache.resolve(object.clone(), same, JsProvider::new);
        let again = cache.resolve(object, same, JsProvider::new);
        assert!(Rc::ptr_eq(&first, &again));

        let lookalike = cache.resolve(Object::new().into(), same, JsProvider::new);
        assert!(!Rc::ptr_eq(&first, &lookalike));
    }
}
