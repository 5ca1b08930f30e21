//! Marketplace approval service.
//!
//! Job posters review submitted completions here. A rejection records the
//! outcome and costs nothing; an approval is answered with a 402 payment
//! challenge until the poster proves a qualifying USDC transfer to the
//! worker, at which point the job settles, reputation updates, and a
//! ledger entry is written.
//!
//! # Modules
//!
//! - [`store`] - marketplace records and the storage trait
//! - [`memory`] - in-memory store for tests and development
//! - [`reputation`] - agent reputation scoring
//! - [`approval`] - the review/payment state machine
//! - [`handlers`] - axum routes and error mapping
//! - [`config`] - environment-driven service configuration

pub mod approval;
pub mod config;
pub mod handlers;
pub mod memory;
pub mod reputation;
pub mod store;

pub use approval::{ApprovalEngine, ApprovalError};
pub use memory::MemoryStore;
pub use store::MarketStore;
