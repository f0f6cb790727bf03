//! Points Ledger Core
//!
//! Per-user reward points ledger with oldest-first spending.
//!
//! # Architecture
//!
//! - **Append-only**: Balances are folded from immutable transactions
//! - **Single Writer**: One actor task serializes every operation, so a spend's
//!   plan and commit never interleave with another request
//! - **Pure Planner**: Spending plans are computed from a snapshot and never
//!   mutate stored history

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    rust_2018_idioms,
    missing_debug_implementations,
    clippy::all
)]
//!
//! # Invariants
//!
//! - Balance of a payer == Σ(points) of that payer's transactions
//! - A spend commits exactly the requested amount or nothing
//! - A successful spend never drives a payer negative
//! - Points are spent in timestamp order, net of corrections

pub mod types;
pub mod validation;
pub mod store;
pub mod planner;
pub mod book;
pub mod error;
pub mod actor;
pub mod ledger;
pub mod config;
pub mod metrics;

// Re-exports
pub use error::{Error, Result};
pub use types::{Allocation, Balances, PayerId, Transaction, UserId};
pub use validation::{Field, SpendRequest, TransactionRequest, ValidationError};
pub use planner::{create_spending_plan, SpendingPlan};
pub use store::{MemoryStore, TransactionStore};
pub use ledger::Ledger;
pub use config::{Config, LogFormat};
pub use metrics::Metrics;
