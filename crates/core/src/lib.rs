//! Domain building blocks for the carehook webhook delivery service.
//!
//! This crate has zero internal dependencies so the store, the delivery
//! engine and the HTTP layer can all share the same types:
//!
//! - [`webhooks`]: endpoint, event and delivery-record types.
//! - [`signing`]: HMAC-SHA256 payload signatures.
//! - [`matching`]: two-segment wildcard event patterns.
//! - [`validation`]: endpoint URL and pattern validation.
//! - [`secrets`]: signing secret generation.
//! - [`pagination`]: limit/offset clamping shared by list operations.

pub mod error;
pub mod matching;
pub mod pagination;
pub mod secrets;
pub mod signing;
pub mod types;
pub mod validation;
pub mod webhooks;
