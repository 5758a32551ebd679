//! WASM module: browser bindings for the connector
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │       PhantomConnector (JS API)         │
//! │  connect, disconnect, signMessage, ...  │
//! └─────────────────┬───────────────────────┘
//!                   │
//! ┌─────────────────▼───────────────────────┐
//! │        Connector<BrowserHost>           │
//! │  session state + observer registry      │
//! └─────────────────┬───────────────────────┘
//!                   │
//! ┌─────────────────▼───────────────────────┐
//! │   BrowserHost → JsProvider              │
//! │   window.solana (isPhantom)             │
//! └─────────────────────────────────────────┘
//! ```

mod connector;
mod host;
mod logging;
mod provider;

pub use connector::{shorten_key_js, PhantomConnector};
pub use host::BrowserHost;
pub use logging::{init_logging, ConsoleMakeWriter, ConsoleWriter};
pub use provider::JsProvider;

use wasm_bindgen::prelude::*;

/// Initialize WASM module (called automatically on load)
#[wasm_bindgen(start)]
pub fn start() {
    console_error_panic_hook::set_once();
}
