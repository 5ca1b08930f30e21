//! Core types for the workpay x402 marketplace payment protocol.
//!
//! Jobs on the marketplace are paid directly poster → worker in USDC on an
//! EVM chain. Approving a completed job is gated behind the HTTP 402
//! challenge/response cycle: the server answers the first approval attempt
//! with machine-readable payment requirements, the client pays on-chain and
//! retries with proof, and the server verifies the transfer before mutating
//! any job state.
//!
//! This crate holds the chain- and transport-agnostic pieces of that flow.
//! EVM implementations live in `workpay-evm`, the HTTP transport in
//! `workpay-http`, and the server-side approval state machine in
//! `workpay-server`.
//!
//! # Modules
//!
//! - [`amount`] - USDC amount codec (decimal ↔ 6-decimal base units)
//! - [`classify`] - Transfer failure classification with remediation context
//! - [`config`] - Persisted client configuration
//! - [`networks`] - The closed set of supported networks and USDC deployments
//! - [`proof`] - The discriminated payment-proof value
//! - [`proto`] - Wire types for the approval endpoint
//! - [`requirement`] - Payment requirements carried by 402 responses
//! - [`timestamp`] - Unix timestamps for review/settlement records
//! - [`verify`] - Verification results and verifier capability traits
//! - [`wallet`] - Wallet provider capability trait

pub mod amount;
pub mod classify;
pub mod config;
pub mod networks;
pub mod proof;
pub mod proto;
pub mod requirement;
pub mod timestamp;
pub mod verify;
pub mod wallet;

pub use amount::UsdcAmount;
pub use networks::Network;
pub use proof::PaymentProof;
pub use requirement::PaymentRequirement;
pub use timestamp::UnixTimestamp;
pub use verify::Verification;
