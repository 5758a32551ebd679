//! Provider boundary: the injected wallet object and the page that hosts it
//!
//! ```text
//! ProviderHost (global scope)
//!   │  locate() → Option<Rc<Provider>>
//!   ▼
//! WalletProvider (injected capability)
//!      connect / disconnect / sign_message / sign_transaction
//!      is_connected / public_key / on_account_changed
//! ```
//!
//! Both traits are single-threaded (`?Send`): every provider call is a
//! suspend point on the page's event loop.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::rc::Rc;

use super::error::ConnectorResult;
use super::identity::Identity;

/// Handler for the provider's native "accountChanged" event.
pub type AccountChangedHandler = Box<dyn Fn(Option<Identity>)>;

/// Options forwarded to the provider's connect capability.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConnectOptions {
    /// Reconnect silently, succeeding only if the provider already trusts the page.
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub only_if_trusted: bool,
}

impl ConnectOptions {
    pub fn only_if_trusted() -> Self {
        Self { only_if_trusted: true }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectResponse {
    pub public_key: Identity,
}

/// A decoded message signature, for providers that answer with plain bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedMessage {
    pub signature: Vec<u8>,
    pub public_key: Identity,
}

/// Message accepted by `sign_message`: text is encoded as UTF-8 before delegation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageInput {
    Text(String),
    Bytes(Vec<u8>),
}

impl MessageInput {
    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            MessageInput::Text(text) => text.into_bytes(),
            MessageInput::Bytes(bytes) => bytes,
        }
    }
}

impl From<&str> for MessageInput {
    fn from(text: &str) -> Self {
        MessageInput::Text(text.to_string())
    }
}

impl From<String> for MessageInput {
    fn from(text: String) -> Self {
        MessageInput::Text(text)
    }
}

impl From<Vec<u8>> for MessageInput {
    fn from(bytes: Vec<u8>) -> Self {
        MessageInput::Bytes(bytes)
    }
}

impl From<&[u8]> for MessageInput {
    fn from(bytes: &[u8]) -> Self {
        MessageInput::Bytes(bytes.to_vec())
    }
}

/// The externally injected wallet capability.
///
/// Only the members the connector actually uses are declared. The browser
/// object and test doubles both implement it.
#[async_trait(?Send)]
pub trait WalletProvider {
    /// Caller-built transaction value, passed through untouched.
    type Transaction;

    /// Provider's answer to `sign_message`, returned to the caller as-is.
    type Signature;

    async fn connect(&self, options: ConnectOptions) -> ConnectorResult<ConnectResponse>;

    async fn disconnect(&self) -> ConnectorResult<()>;

    async fn sign_message(&self, message: Vec<u8>, encoding: &str) -> ConnectorResult<Self::Signature>;

    async fn sign_transaction(&self, transaction: Self::Transaction) -> ConnectorResult<Self::Transaction>;

    /// Provider's own view of whether it is connected.
    fn is_connected(&self) -> bool;

    /// Provider's live public key, if it has one.
    fn public_key(&self) -> Option<Identity>;

    /// Register `handler` for the native "accountChanged" event.
    fn on_account_changed(&self, handler: AccountChangedHandler);
}

/// The global scope the provider is injected into.
pub trait ProviderHost {
    type Provider: WalletProvider + 'static;

    /// Look up a compatible provider.
    ///
    /// Must return the same `Rc` for as long as the underlying object is
    /// unchanged; the connector relies on `Rc::ptr_eq` to avoid registering
    /// its native listener twice.
    fn locate(&self) -> Option<Rc<Self::Provider>>;

    /// Open the provider's install page in a new browsing context.
    fn open_install_page(&self, url: &str);

    fn is_secure_context(&self) -> bool {
        true
    }
}

/// Single-slot cache of provider handles, keyed by the host's notion of
/// object identity.
///
/// Hosts wrap their raw provider object in a fresh `Rc` only when the object
/// changes, which keeps `locate()` returning the same handle for an
/// unchanged provider.
pub struct HandleCache<P> {
    cached: RefCell<Option<Rc<P>>>,
}

impl<P> Default for HandleCache<P> {
    fn default() -> Self {
        Self { cached: RefCell::new(None) }
    }
}

impl<P> HandleCache<P> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached handle if `is_same` holds for `object`, otherwise
    /// wrap `object` with `create` and cache the result.
    pub fn resolve<O>(&self, object: O, is_same: impl Fn(&P, &O) -> bool, create: impl FnOnce(O) -> P) -> Rc<P> {
        let mut cached = self.cached.borrow_mut();
        if let Some(existing) = cached.as_ref() {
            if is_same(existing, &object) {
                return existing.clone();
            }
        }
        let handle = Rc::new(create(object));
        *cached = Some(handle.clone());
        handle
    }

    pub fn current(&self) -> Option<Rc<P>> {
        self.cached.borrow().clone()
    }
}
