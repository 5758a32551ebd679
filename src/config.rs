//! Connector configuration - constructed by the host page

use serde::{Deserialize, Serialize};

pub const DEFAULT_INSTALL_URL: &str = "https://phantom.app/";

/// Connector configuration. Every field has a default, so a host can pass
/// `{}` (or nothing) and override only what it needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConnectorConfig {
    /// Page opened when `connect` finds no provider.
    pub install_url: String,
    pub open_install_page: bool,
    /// Attempt a silent (trusted-only) reconnect from `init`.
    pub auto_reconnect: bool,
    /// Also notify observers with an absent identity after a local disconnect
    /// or when the provider disappears. Off: disconnect stays silent.
    pub notify_on_disconnect: bool,
    /// Encoding tag handed to the provider alongside message bytes.
    pub message_encoding: String,
    /// Property on `window` holding the provider.
    pub provider_global: String,
    /// Vendor flag that must be truthy on the provider object.
    pub vendor_flag: String,
    pub log_level: String,
}

impl Default for ConnectorConfig {
    fn default() -> Self {
        Self {
            install_url: DEFAULT_INSTALL_URL.into(),
            open_install_page: true,
            auto_reconnect: true,
            notify_on_disconnect: false,
            message_encoding: "utf8".into(),
            provider_global: "solana".into(),
            vendor_flag: "isPhantom".into(),
            log_level: "info".into(),
        }
    }
}

impl ConnectorConfig {
    pub fn new() -> Self { Self::default() }
    pub fn with_install_url(mut self, url: impl Into<String>) -> Self { self.install_url = url.into(); self }
    pub fn with_open_install_page(mut self, open: bool) -> Self { self.open_install_page = open; self }
    pub fn with_auto_reconnect(mut self, enabled: bool) -> Self { self.auto_reconnect = enabled; self }
    pub fn with_notify_on_disconnect(mut self, enabled: bool) -> Self { self.notify_on_disconnect = enabled; self }
    pub fn with_message_encoding(mut self, encoding: impl Into<String>) -> Self { self.message_encoding = encoding.into(); self }
    pub fn with_provider_global(mut self, name: impl Into<String>) -> Self { self.provider_global = name.into(); self }
    pub fn with_vendor_flag(mut self, flag: impl Into<String>) -> Self { self.vendor_flag = flag.into(); self }
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self { self.log_level = level.into(); self }

    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }
}
