//! Shared types and ledger math for the Retail Back-Office Platform
//!
//! This crate contains the pure domain rules of the stock ledger: payment
//! status derivation, return settlement arithmetic and lot quantity
//! adjustment planning. It has no I/O dependencies so the backend services
//! and the test suites share one source of truth for the invariants.

pub mod ledger;
pub mod types;
pub mod validation;

pub use ledger::*;
pub use types::*;
pub use validation::*;
