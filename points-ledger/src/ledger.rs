//! Main ledger orchestration layer
//!
//! This module ties together storage, planning and the actor into the
//! high-level API that request handlers call.
//!
//! # Example
//!
//! ```no_run
//! use points_ledger::{Config, Ledger, TransactionRequest, UserId};
//!
//! #[tokio::main]
//! async fn main() -> points_ledger::Result<()> {
//!     let ledger = Ledger::open(Config::default()).await?;
//!     let user = UserId::new("1");
//!
//!     ledger
//!         .add_transaction(&user, TransactionRequest::new("DANNON", 300, "2020-10-31T10:00:00Z"))
//!         .await?;
//!     let committed = ledger.spend(&user, 100).await?;
//!     assert_eq!(committed[0].points, -100);
//!
//!     Ok(())
//! }
//! ```

use crate::{
    actor::{spawn_ledger_actor, LedgerHandle},
    book::PointsBook,
    metrics::Metrics,
    planner::SpendingPlan,
    store::{MemoryStore, TransactionStore},
    types::{Allocation, Balances, Transaction, UserId},
    validation::TransactionRequest,
    Config, Result,
};
use std::sync::Arc;

/// Main ledger interface
#[derive(Clone, Debug)]
pub struct Ledger {
    /// Actor handle for async operations
    handle: LedgerHandle,

    /// Metrics shared with the actor
    metrics: Metrics,

    /// Configuration
    config: Arc<Config>,
}

impl Ledger {
    /// Open an in-memory ledger with configuration
    pub async fn open(config: Config) -> Result<Self> {
        Self::with_store(config, Arc::new(MemoryStore::new())).await
    }

    /// Open a ledger over an explicit store
    pub async fn with_store(config: Config, store: Arc<dyn TransactionStore>) -> Result<Self> {
        let metrics = Metrics::new()?;
        let book = PointsBook::new(store, metrics.clone());
        let handle = spawn_ledger_actor(book, config.mailbox_capacity);

        tracing::info!(
            service = %config.service_name,
            mailbox_capacity = config.mailbox_capacity,
            "Ledger opened"
        );

        Ok(Self {
            handle,
            metrics,
            config: Arc::new(config),
        })
    }

    /// Validate and append a transaction to `user`'s ledger
    pub async fn add_transaction(&self, user: &UserId, request: TransactionRequest) -> Result<()> {
        self.handle.add_transaction(user.clone(), request).await
    }

    /// Per-payer balances; payers never seen have no entry
    pub async fn get_balances(&self, user: &UserId) -> Result<Balances> {
        self.handle.get_balances(user.clone()).await
    }

    /// Transaction history in insertion order
    pub async fn get_transactions(&self, user: &UserId) -> Result<Vec<Transaction>> {
        self.handle.get_transactions(user.clone()).await
    }

    /// Spending plan for `points` without committing anything
    pub async fn create_spending_plan(&self, user: &UserId, points: i64) -> Result<SpendingPlan> {
        self.handle.plan(user.clone(), points).await
    }

    /// Spend `points`, oldest first; all or nothing
    ///
    /// Returns the committed per-payer deltas in plan order, or
    /// [`crate::Error::InsufficientPoints`] with the ledger left untouched.
    pub async fn spend(&self, user: &UserId, points: i64) -> Result<Vec<Allocation>> {
        self.handle.spend(user.clone(), points).await
    }

    /// Metrics collector
    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    /// Configuration the ledger was opened with
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Shutdown ledger
    pub async fn shutdown(self) -> Result<()> {
        self.handle.shutdown().await
    }
}
