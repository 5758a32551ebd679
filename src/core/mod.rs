//! Core: platform-independent session logic
//!
//! Everything here compiles natively and under wasm. The browser provider
//! lives in `crate::wasm`; tests drive the same code through in-memory doubles.

pub mod error;
pub mod identity;
pub mod notifier;
pub mod provider;
pub mod session;
