//! HTTP transport for the workpay payment protocol.
//!
//! The server side issues 402 challenges and gates approval on payment
//! proof; the client side reads a challenge, pays it, and resubmits.
//!
//! # Modules
//!
//! - [`constants`] - HTTP header names and defaults
//! - [`headers`] - JSON encoding/decoding for challenge headers
//! - [`error`] - transport error types
//! - [`facilitator`] - receipt verification against a remote facilitator
//! - [`gate`] - proof dispatch between on-chain and facilitator verifiers
//! - [`client`] - the paying approval client

pub mod client;
pub mod constants;
pub mod error;
pub mod facilitator;
pub mod gate;
pub mod headers;

pub use client::{ApprovalClient, ClientError};
pub use facilitator::FacilitatorClient;
pub use gate::PaymentGate;
