//! Connector errors and the best-effort outcome type.

use std::any::Any;
use std::fmt;
use std::rc::Rc;
use thiserror::Error;

pub type ConnectorResult<T> = Result<T, ConnectorError>;

/// Error code providers use when the user dismisses a request.
pub const USER_REJECTED_CODE: i64 = 4001;

/// The provider's own rejection value, carried so a boundary can rethrow it
/// untouched. Two causes are equal only if they are the same value.
#[derive(Clone)]
pub struct RawCause(Rc<dyn Any>);

impl RawCause {
    pub fn new<T: Any>(value: T) -> Self {
        Self(Rc::new(value))
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref::<T>()
    }
}

impl PartialEq for RawCause {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for RawCause {}

impl fmt::Debug for RawCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("RawCause(..)")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConnectorError {
    /// No compatible provider on the page. Recoverable by installing the extension.
    #[error("wallet provider not found; install it from {install_url}")]
    ProviderNotFound { install_url: String },

    /// The user declined the request inside the extension.
    #[error("request rejected by user: {message}")]
    UserRejected { message: String, cause: Option<RawCause> },

    /// Any other provider-side failure, including malformed responses.
    #[error("provider error: {message}")]
    Provider { message: String, cause: Option<RawCause> },
}

impl ConnectorError {
    pub fn provider(message: impl Into<String>) -> Self {
        ConnectorError::Provider { message: message.into(), cause: None }
    }

    pub fn user_rejected(message: impl Into<String>) -> Self {
        ConnectorError::UserRejected { message: message.into(), cause: None }
    }

    /// Classify a rejected provider call by its numeric `code`.
    pub fn from_provider_code(code: Option<i64>, message: impl Into<String>) -> Self {
        if code == Some(USER_REJECTED_CODE) {
            Self::user_rejected(message)
        } else {
            Self::provider(message)
        }
    }

    /// Attach the provider's raw rejection. `ProviderNotFound` has no
    /// provider-side value and is returned unchanged.
    pub fn with_cause(mut self, raw: RawCause) -> Self {
        match &mut self {
            ConnectorError::UserRejected { cause, .. } | ConnectorError::Provider { cause, .. } => {
                *cause = Some(raw);
            }
            ConnectorError::ProviderNotFound { .. } => {}
        }
        self
    }

    pub fn cause(&self) -> Option<&RawCause> {
        match self {
            ConnectorError::UserRejected { cause, .. } | ConnectorError::Provider { cause, .. } => cause.as_ref(),
            ConnectorError::ProviderNotFound { .. } => None,
        }
    }

    /// Stable variant name, used as the JS `Error.name`.
    pub fn kind(&self) -> &'static str {
        match self {
            ConnectorError::ProviderNotFound { .. } => "ProviderNotFound",
            ConnectorError::UserRejected { .. } => "UserRejected",
            ConnectorError::Provider { .. } => "ProviderError",
        }
    }

    pub fn is_provider_not_found(&self) -> bool {
        matches!(self, ConnectorError::ProviderNotFound { .. })
    }

    pub fn is_user_rejected(&self) -> bool {
        matches!(self, ConnectorError::UserRejected { .. })
    }
}

/// Outcome of an operation whose failures are logged and never propagated.
///
/// `disconnect` and `silent_reconnect` return this instead of a `Result` so
/// the quiet-failure contract is part of the signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BestEffort<T> {
    /// The provider call succeeded.
    Done(T),
    /// No provider was detected, nothing was attempted.
    Skipped,
    /// The provider call failed; the error was logged and absorbed.
    Absorbed(ConnectorError),
}

impl<T> BestEffort<T> {
    pub fn is_done(&self) -> bool {
        matches!(self, BestEffort::Done(_))
    }

    pub fn done(self) -> Option<T> {
        match self {
            BestEffort::Done(value) => Some(value),
            _ => None,
        }
    }

    pub fn absorbed(&self) -> Option<&ConnectorError> {
        match self {
            BestEffort::Absorbed(err) => Some(err),
            _ => None,
        }
    }
}
