//! Capabilities backed by external providers (object storage, messaging,
//! payment gateway). Services only see the traits; concrete clients are
//! chosen when [`crate::state::AppState`] is built.

pub mod notify;
pub mod payment;
pub mod storage;
