//! Session state: the single source of truth for "am I connected"

use serde::Serialize;
use std::rc::Rc;

use super::identity::Identity;

/// Where the session sits in its state machine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "identity", rename_all = "lowercase")]
pub enum SessionStatus {
    /// No detection attempt has run yet.
    Unknown,
    /// Provider absent, or present without an identity.
    Disconnected,
    Connected(Identity),
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Unknown => "unknown",
            SessionStatus::Disconnected => "disconnected",
            SessionStatus::Connected(_) => "connected",
        }
    }

    pub fn identity(&self) -> Option<&Identity> {
        match self {
            SessionStatus::Connected(identity) => Some(identity),
            _ => None,
        }
    }
}

/// Provider handle that carries our native "accountChanged" listener.
struct Listener<P> {
    provider: Rc<P>,
    generation: u64,
}

/// Cached provider handle and identity.
///
/// Invariant: `identity` is only present while `provider` is.
pub struct SessionState<P> {
    provider: Option<Rc<P>>,
    identity: Option<Identity>,
    detected: bool,
    listener: Option<Listener<P>>,
}

impl<P> Default for SessionState<P> {
    fn default() -> Self {
        Self { provider: None, identity: None, detected: false, listener: None }
    }
}

/// What a detection pass changed.
pub(crate) struct Detection {
    /// Generation to hand to a freshly registered listener.
    pub register: Option<u64>,
    /// An identity was cached and the provider is now gone.
    pub lost_identity: bool,
}

impl<P> SessionState<P> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn provider(&self) -> Option<&Rc<P>> {
        self.provider.as_ref()
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    pub fn status(&self) -> SessionStatus {
        match (&self.identity, self.detected) {
            (Some(identity), _) => SessionStatus::Connected(identity.clone()),
            (None, true) => SessionStatus::Disconnected,
            (None, false) => SessionStatus::Unknown,
        }
    }

    /// Record the outcome of a provider lookup.
    pub(crate) fn record_detection(&mut self, located: Option<Rc<P>>) -> Detection {
        self.detected = true;
        match located {
            None => {
                self.provider = None;
                Detection { register: None, lost_identity: self.identity.take().is_some() }
            }
            Some(provider) => {
                let listening = self
                    .listener
                    .as_ref()
                    .is_some_and(|l| Rc::ptr_eq(&l.provider, &provider));
                let register = if listening {
                    None
                } else {
                    let generation = self.listener.as_ref().map_or(1, |l| l.generation + 1);
                    self.listener = Some(Listener { provider: provider.clone(), generation });
                    Some(generation)
                };
                self.provider = Some(provider);
                Detection { register, lost_identity: false }
            }
        }
    }

    /// Apply a provider-driven account change.
    ///
    /// Returns `false` when the event comes from a listener on a provider
    /// handle that has since been replaced.
    pub(crate) fn apply_account_change(&mut self, generation: u64, identity: Option<Identity>) -> bool {
        let Some(listener) = self.listener.as_ref() else {
            return false;
        };
        if listener.generation != generation {
            return false;
        }
        if self.provider.is_none() {
            self.provider = Some(listener.provider.clone());
        }
        self.identity = identity;
        true
    }

    pub(crate) fn set_identity(&mut self, identity: Identity) {
        self.identity = Some(identity);
    }

    pub(crate) fn clear_identity(&mut self) -> Option<Identity> {
        self.identity.take()
    }
}
