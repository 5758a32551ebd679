//! Connector - session object wrapping a provider host
//!
//! One `Connector` is built per page context and cloned into whatever code
//! needs it. It owns the session state and the observer registry; the
//! provider itself stays behind the `ProviderHost` seam.
//!
//! Provider calls are plain futures with no timeout. Callers that need one
//! race the returned future against their own timer. Concurrent `connect` and
//! `disconnect` calls are not queued: whichever resolves last decides the
//! final state.

use std::cell::RefCell;
use std::rc::{Rc, Weak};
use tracing::{debug, info, warn};

use crate::config::ConnectorConfig;
use crate::core::error::{BestEffort, ConnectorError, ConnectorResult};
use crate::core::identity::Identity;
use crate::core::notifier::{invoke_guarded, Observer, ObserverRegistry, Subscription};
use crate::core::provider::{AccountChangedHandler, ConnectOptions, MessageInput, ProviderHost, WalletProvider};
use crate::core::session::{SessionState, SessionStatus};

/// Transaction type accepted by the host's provider.
pub type TransactionOf<H> = <<H as ProviderHost>::Provider as WalletProvider>::Transaction;

/// Signed-message value produced by the host's provider.
pub type SignatureOf<H> = <<H as ProviderHost>::Provider as WalletProvider>::Signature;

/// Result of a successful `connect`.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct Connection {
    #[serde(rename = "publicKey")]
    pub identity: Identity,
}

pub struct Connector<H: ProviderHost> {
    inner: Rc<ConnectorInner<H>>,
}

impl<H: ProviderHost> Clone for Connector<H> {
    fn clone(&self) -> Self {
        Self { inner: self.inner.clone() }
    }
}

struct ConnectorInner<H: ProviderHost> {
    host: H,
    config: ConnectorConfig,
    session: RefCell<SessionState<H::Provider>>,
    observers: ObserverRegistry,
}

impl<H: ProviderHost + 'static> Connector<H> {
    pub fn new(host: H, config: ConnectorConfig) -> Self {
        Self {
            inner: Rc::new(ConnectorInner {
                host,
                config,
                session: RefCell::new(SessionState::new()),
                observers: ObserverRegistry::new(),
            }),
        }
    }

    pub fn config(&self) -> &ConnectorConfig {
        &self.inner.config
    }

    pub fn host(&self) -> &H {
        &self.inner.host
    }

    /// Page-load entry point: silent reconnect when enabled, bare detection otherwise.
    pub async fn init(&self) -> BestEffort<Identity> {
        if !self.inner.host.is_secure_context() {
            warn!("page is not a secure context; wallet providers may refuse to connect");
        }
        if self.inner.config.auto_reconnect {
            self.silent_reconnect().await
        } else {
            self.detect_provider();
            BestEffort::Skipped
        }
    }

    // =========================================================================
    // PROVIDER LOCATOR
    // =========================================================================

    /// Look up the provider and attach the account-changed listener the
    /// first time a given handle is seen.
    pub fn detect_provider(&self) -> Option<Rc<H::Provider>> {
        let located = self.inner.host.locate();
        let detection = self.inner.session.borrow_mut().record_detection(located.clone());

        match (&located, detection.register) {
            (Some(provider), Some(generation)) => {
                debug!(generation, "provider detected, attaching accountChanged listener");
                provider.on_account_changed(self.account_changed_handler(generation));
            }
            (None, _) => debug!("no provider on page"),
            _ => {}
        }

        if detection.lost_identity {
            info!("provider disappeared; cached identity cleared");
            if self.inner.config.notify_on_disconnect {
                self.inner.observers.notify(None);
            }
        }
        located
    }

    fn account_changed_handler(&self, generation: u64) -> AccountChangedHandler {
        let weak: Weak<ConnectorInner<H>> = Rc::downgrade(&self.inner);
        Box::new(move |identity| {
            if let Some(inner) = weak.upgrade() {
                inner.handle_account_changed(generation, identity);
            }
        })
    }

    // =========================================================================
    // SESSION STATE
    // =========================================================================

    /// True if an identity is cached or the provider reports itself connected.
    pub fn is_connected(&self) -> bool {
        let provider = self.detect_provider();
        let cached = self.inner.session.borrow().identity().is_some();
        cached || provider.is_some_and(|p| p.is_connected())
    }

    /// Cached identity, falling back to the provider's live public key.
    pub fn identity(&self) -> Option<Identity> {
        let provider = self.detect_provider();
        if let Some(identity) = self.inner.session.borrow().identity() {
            return Some(identity.clone());
        }
        provider.and_then(|p| p.public_key())
    }

    pub fn status(&self) -> SessionStatus {
        self.inner.session.borrow().status()
    }

    // =========================================================================
    // CONNECTION OPERATIONS
    // =========================================================================

    /// Ask the provider to connect. Opens the install page when no provider
    /// is present; provider errors propagate unchanged.
    pub async fn connect(&self, options: ConnectOptions) -> ConnectorResult<Connection> {
        let Some(provider) = self.detect_provider() else {
            let install_url = self.inner.config.install_url.clone();
            if self.inner.config.open_install_page {
                self.inner.host.open_install_page(&install_url);
            }
            warn!(%install_url, "connect requested but no provider is installed");
            return Err(ConnectorError::ProviderNotFound { install_url });
        };

        let response = provider.connect(options).await?;
        let identity = response.public_key;
        if !self.is_current(&provider) {
            warn!(identity = %identity.short(), "provider changed while connect was pending; result dropped");
            return Err(ConnectorError::provider("provider changed while connect was pending"));
        }
        self.inner.session.borrow_mut().set_identity(identity.clone());
        info!(identity = %identity.short(), only_if_trusted = options.only_if_trusted, "connected");
        self.inner.observers.notify(Some(&identity));
        Ok(Connection { identity })
    }

    /// Best-effort disconnect. Never fails to the caller.
    pub async fn disconnect(&self) -> BestEffort<()> {
        let Some(provider) = self.detect_provider() else {
            debug!("disconnect skipped: no provider");
            return BestEffort::Skipped;
        };

        match provider.disconnect().await {
            Ok(()) => {
                let previous = self.inner.session.borrow_mut().clear_identity();
                info!(previous = ?previous.as_ref().map(Identity::short), "disconnected");
                if self.inner.config.notify_on_disconnect {
                    self.inner.observers.notify(None);
                }
                BestEffort::Done(())
            }
            Err(err) => {
                warn!(error = %err, "disconnect failed");
                BestEffort::Absorbed(err)
            }
        }
    }

    /// Trusted-only reconnect for page load. Never prompts, never fails to
    /// the caller.
    pub async fn silent_reconnect(&self) -> BestEffort<Identity> {
        let Some(provider) = self.detect_provider() else {
            debug!("silent reconnect skipped: no provider");
            return BestEffort::Skipped;
        };

        match provider.connect(ConnectOptions::only_if_trusted()).await {
            Ok(_) if !self.is_current(&provider) => {
                debug!("provider changed while silent reconnect was pending; result dropped");
                BestEffort::Absorbed(ConnectorError::provider("provider changed while connect was pending"))
            }
            Ok(response) => {
                let identity = response.public_key;
                self.inner.session.borrow_mut().set_identity(identity.clone());
                info!(identity = %identity.short(), "silently reconnected");
                self.inner.observers.notify(Some(&identity));
                BestEffort::Done(identity)
            }
            Err(err) => {
                debug!(error = %err, "no trusted session to restore");
                BestEffort::Absorbed(err)
            }
        }
    }

    // =========================================================================
    // DELEGATED REQUESTS
    // =========================================================================

    /// Sign a text or byte message. Requires a detected provider; never
    /// connects implicitly.
    pub async fn sign_message(&self, message: impl Into<MessageInput>) -> ConnectorResult<SignatureOf<H>> {
        let provider = self.require_provider()?;
        let bytes = message.into().into_bytes();
        provider.sign_message(bytes, &self.inner.config.message_encoding).await
    }

    pub async fn sign_transaction(&self, transaction: TransactionOf<H>) -> ConnectorResult<TransactionOf<H>> {
        let provider = self.require_provider()?;
        provider.sign_transaction(transaction).await
    }

    /// Re-detect after a suspend point; true if `provider` is still the one on the page.
    fn is_current(&self, provider: &Rc<H::Provider>) -> bool {
        self.detect_provider().is_some_and(|current| Rc::ptr_eq(&current, provider))
    }

    fn require_provider(&self) -> ConnectorResult<Rc<H::Provider>> {
        self.detect_provider().ok_or_else(|| ConnectorError::ProviderNotFound {
            install_url: self.inner.config.install_url.clone(),
        })
    }

    // =========================================================================
    // CHANGE NOTIFIER
    // =========================================================================

    /// Subscribe to identity changes. `observer` is called once right away
    /// with the current identity, then on every change.
    pub fn on_identity_change<F>(&self, observer: F) -> Subscription
    where
        F: Fn(Option<&Identity>) + 'static,
    {
        self.on_identity_change_shared(Rc::new(observer))
    }

    /// Like `on_identity_change`, for an observer shared between several
    /// registrations. Each registration needs its own unsubscribe.
    pub fn on_identity_change_shared(&self, observer: Observer) -> Subscription {
        let subscription = self.inner.observers.subscribe(observer.clone());
        let current = self.identity();
        invoke_guarded(subscription.id(), &observer, current.as_ref());
        subscription
    }

    pub fn observer_count(&self) -> usize {
        self.inner.observers.len()
    }
}

impl<H: ProviderHost> ConnectorInner<H> {
    fn handle_account_changed(&self, generation: u64, identity: Option<Identity>) {
        let applied = self.session.borrow_mut().apply_account_change(generation, identity.clone());
        if !applied {
            debug!(generation, "ignoring accountChanged from a replaced provider");
            return;
        }
        match &identity {
            Some(id) => info!(identity = %id.short(), "account changed in provider"),
            None => info!("provider reported no account"),
        }
        self.observers.notify(identity.as_ref());
    }
}
