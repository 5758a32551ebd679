//! phantom-link: page-side connector for an injected Solana wallet provider.
//!
//! # Architecture
//!
//! ```text
//! Connector (one per page)
//!   │
//!   ├── ProviderHost ── locate() ──► WalletProvider (window.solana)
//!   │                                 connect / disconnect / sign / on("accountChanged")
//!   │
//!   ├── SessionState      Unknown → Disconnected ⇄ Connected(identity)
//!   │
//!   └── ObserverRegistry  on_identity_change(cb) → Subscription
//! ```
//!
//! The connector never touches key material. It coordinates a capability it
//! does not control: detection, connect/disconnect, a single silent reconnect
//! at page load, and identity-change notifications.
//!
//! # Operations
//!
//! | Operation | Method | Failure |
//! |-----------|--------|---------|
//! | detect | `detect_provider()` | absent |
//! | connect | `connect(options)` | `ProviderNotFound`, `UserRejected`, `Provider` |
//! | disconnect | `disconnect()` | absorbed (`BestEffort`) |
//! | silent reconnect | `silent_reconnect()` / `init()` | absorbed (`BestEffort`) |
//! | state | `is_connected()`, `identity()`, `status()` | none |
//! | sign | `sign_message(msg)`, `sign_transaction(tx)` | `ProviderNotFound`, `Provider` |
//! | observe | `on_identity_change(cb)` | none |
//!
//! # Features
//!
//! - `native` - stderr logging via tracing-subscriber
//! - `wasm` - browser bindings: `window.solana` provider, `PhantomConnector` JS class
//!
//! # Usage
//!
//! ```ignore
//! use phantom_link::{ConnectOptions, Connector, ConnectorConfig};
//!
//! let connector = Connector::new(host, ConnectorConfig::default());
//! connector.init().await;
//!
//! let sub = connector.on_identity_change(|id| println!("identity: {id:?}"));
//! let connection = connector.connect(ConnectOptions::default()).await?;
//! let signed = connector.sign_message("hello").await?;
//! sub.unsubscribe();
//! ```

// =============================================================================
// Shared modules (compile everywhere)
// =============================================================================
pub mod config;
pub mod connector;
pub mod core;

// =============================================================================
// Native-only modules
// =============================================================================
#[cfg(feature = "native")]
pub mod logging;

// =============================================================================
// WASM-only modules (browser, wasm-bindgen)
// =============================================================================
#[cfg(feature = "wasm")]
pub mod wasm;

// =============================================================================
// Re-exports: Shared
// =============================================================================
pub use config::ConnectorConfig;
pub use connector::{Connection, Connector, SignatureOf, TransactionOf};
pub use crate::core::error::{BestEffort, ConnectorError, ConnectorResult, RawCause, USER_REJECTED_CODE};
pub use crate::core::identity::{shorten_key, Identity};
pub use crate::core::notifier::{Observer, ObserverRegistry, Subscription};
pub use crate::core::provider::{
    AccountChangedHandler, ConnectOptions, ConnectResponse, HandleCache, MessageInput, ProviderHost,
    SignedMessage, WalletProvider,
};
pub use crate::core::session::{SessionState, SessionStatus};

// =============================================================================
// Re-exports: WASM
// =============================================================================
#[cfg(feature = "wasm")]
pub use wasm::{BrowserHost, JsProvider, PhantomConnector};
