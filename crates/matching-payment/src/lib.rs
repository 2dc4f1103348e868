//! # matching-payment
//!
//! Adapters for the [`PaymentGateway`](matching_core::PaymentGateway) port.
//!
//! - [`HttpPaymentGateway`]: JSON-over-HTTP client with a bounded timeout and
//!   an `Idempotency-Key` header on every state-changing call
//! - [`RecordingGateway`]: scripted in-process gateway that records every call,
//!   for service tests and local runs

mod http;
mod protocol;
mod recording;

pub use http::HttpPaymentGateway;
pub use recording::{GatewayCall, RecordingGateway};
