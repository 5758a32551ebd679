//! In-memory provider and host doubles shared by the integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use futures::channel::oneshot;
use phantom_link::{
    AccountChangedHandler, ConnectOptions, ConnectResponse, ConnectorError, ConnectorResult,
    Identity, ProviderHost, SignedMessage, WalletProvider,
};
use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

pub const FIRST_KEY: &str = "Addr1234...WXYZ";
pub const SECOND_KEY: &str = "Addr5678...ABCD";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockTransaction {
    pub payload: Vec<u8>,
    pub signers: Vec<String>,
}

impl MockTransaction {
    pub fn new(payload: &[u8]) -> Self {
        Self { payload: payload.to_vec(), signers: Vec::new() }
    }
}

/// Scriptable stand-in for the injected wallet.
pub struct MockProvider {
    account: RefCell<Option<Identity>>,
    trusted: Cell<bool>,
    connected: Cell<bool>,
    reject_connect: RefCell<Option<ConnectorError>>,
    fail_disconnect: Cell<bool>,
    hang: Cell<bool>,
    gates: RefCell<VecDeque<oneshot::Receiver<()>>>,
    handlers: RefCell<Vec<AccountChangedHandler>>,
    pub connect_calls: RefCell<Vec<ConnectOptions>>,
    pub disconnect_calls: Cell<usize>,
    pub sign_calls: RefCell<Vec<(Vec<u8>, String)>>,
}

impl MockProvider {
    pub fn new(account: &str) -> Rc<Self> {
        Rc::new(Self {
            account: RefCell::new(Some(Identity::from(account))),
            trusted: Cell::new(false),
            connected: Cell::new(false),
            reject_connect: RefCell::new(None),
            fail_disconnect: Cell::new(false),
            hang: Cell::new(false),
            gates: RefCell::new(VecDeque::new()),
            handlers: RefCell::new(Vec::new()),
            connect_calls: RefCell::new(Vec::new()),
            disconnect_calls: Cell::new(0),
            sign_calls: RefCell::new(Vec::new()),
        })
    }

    /// A provider that already trusts the page (silent reconnect succeeds).
    pub fn trusted(account: &str) -> Rc<Self> {
        let provider = Self::new(account);
        provider.trusted.set(true);
        provider
    }

    /// Provider already authenticated before the connector ran.
    pub fn preconnected(account: &str) -> Rc<Self> {
        let provider = Self::trusted(account);
        provider.connected.set(true);
        provider
    }

    pub fn reject_next_connect(&self, err: ConnectorError) {
        *self.reject_connect.borrow_mut() = Some(err);
    }

    pub fn fail_disconnect(&self) {
        self.fail_disconnect.set(true);
    }

    pub fn hang(&self) {
        self.hang.set(true);
    }

    /// Hold the next connect/disconnect call until the returned sender fires.
    pub fn gate(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.gates.borrow_mut().push_back(rx);
        tx
    }

    pub fn listener_count(&self) -> usize {
        self.handlers.borrow().len()
    }

    /// Simulate the user switching accounts inside the extension.
    pub fn emit_account_changed(&self, key: Option<&str>) {
        let identity = key.map(Identity::from);
        *self.account.borrow_mut() = identity.clone();
        self.connected.set(identity.is_some());
        for handler in self.handlers.borrow().iter() {
            handler(identity.clone());
        }
    }

    async fn wait_gate(&self) {
        let gate = self.gates.borrow_mut().pop_front();
        if let Some(gate) = gate {
            let _ = gate.await;
        }
        if self.hang.get() {
            futures::future::pending::<()>().await;
        }
    }
}

#[async_trait(?Send)]
impl WalletProvider for MockProvider {
    type Transaction = MockTransaction;
    type Signature = SignedMessage;

    async fn connect(&self, options: ConnectOptions) -> ConnectorResult<ConnectResponse> {
        self.connect_calls.borrow_mut().push(options);
        self.wait_gate().await;

        if let Some(err) = self.reject_connect.borrow_mut().take() {
            return Err(err);
        }
        if options.only_if_trusted && !self.trusted.get() {
            return Err(ConnectorError::user_rejected("page is not trusted"));
        }
        let public_key = self
            .account
            .borrow()
            .clone()
            .ok_or_else(|| ConnectorError::provider("wallet is locked"))?;
        self.trusted.set(true);
        self.connected.set(true);
        Ok(ConnectResponse { public_key })
    }

    async fn disconnect(&self) -> ConnectorResult<()> {
        self.disconnect_calls.set(self.disconnect_calls.get() + 1);
        self.wait_gate().await;

        if self.fail_disconnect.get() {
            return Err(ConnectorError::provider("extension context invalidated"));
        }
        self.connected.set(false);
        Ok(())
    }

    async fn sign_message(&self, message: Vec<u8>, encoding: &str) -> ConnectorResult<SignedMessage> {
        self.sign_calls.borrow_mut().push((message.clone(), encoding.to_string()));
        let public_key = self
            .account
            .borrow()
            .clone()
            .ok_or_else(|| ConnectorError::provider("wallet is locked"))?;
        let mut signature = message;
        signature.reverse();
        Ok(SignedMessage { signature, public_key })
    }

    async fn sign_transaction(&self, mut transaction: MockTransaction) -> ConnectorResult<MockTransaction> {
        let signer = self
            .account
            .borrow()
            .clone()
            .ok_or_else(|| ConnectorError::provider("wallet is locked"))?;
        transaction.signers.push(signer.into_string());
        Ok(transaction)
    }

    fn is_connected(&self) -> bool {
        self.connected.get()
    }

    fn public_key(&self) -> Option<Identity> {
        if self.connected.get() {
            self.account.borrow().clone()
        } else {
            None
        }
    }

    fn on_account_changed(&self, handler: AccountChangedHandler) {
        self.handlers.borrow_mut().push(handler);
    }
}

/// Page double: holds (or lacks) a provider and records install-page opens.
pub struct MockHost {
    provider: RefCell<Option<Rc<MockProvider>>>,
    secure: Cell<bool>,
    pub install_pages: RefCell<Vec<String>>,
}

impl MockHost {
    pub fn empty() -> Self {
        Self { provider: RefCell::new(None), secure: Cell::new(true), install_pages: RefCell::new(Vec::new()) }
    }

    pub fn with_provider(provider: Rc<MockProvider>) -> Self {
        let host = Self::empty();
        host.install(provider);
        host
    }

    pub fn install(&self, provider: Rc<MockProvider>) {
        *self.provider.borrow_mut() = Some(provider);
    }

    pub fn remove(&self) {
        self.provider.borrow_mut().take();
    }

    pub fn set_secure(&self, secure: bool) {
        self.secure.set(secure);
    }
}

impl ProviderHost for MockHost {
    type Provider = MockProvider;

    fn locate(&self) -> Option<Rc<MockProvider>> {
        self.provider.borrow().clone()
    }

    fn open_install_page(&self, url: &str) {
        self.install_pages.borrow_mut().push(url.to_string());
    }

    fn is_secure_context(&self) -> bool {
        self.secure.get()
    }
}

/// Observer that records every identity it is handed.
pub fn recorder() -> (Rc<RefCell<Vec<Option<String>>>>, impl Fn(Option<&Identity>) + 'static) {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = seen.clone();
    (seen, move |identity: Option<&Identity>| {
        sink.borrow_mut().push(identity.map(|id| id.to_string()));
    })
}
