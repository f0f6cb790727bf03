//! Transaction storage
//!
//! The ledger talks to storage through [`TransactionStore`] so the in-memory
//! map can be swapped for a persistent backend or a fresh instance per test.
//!
//! # Layout
//!
//! - One append-only `Vec<Transaction>` per user, in insertion order
//! - Ledgers are created lazily on first reference

use crate::{
    error::Result,
    types::{Transaction, UserId},
};
use dashmap::DashMap;

/// Append-only, per-user transaction storage
pub trait TransactionStore: Send + Sync {
    /// Append a batch of transactions to a user's ledger
    ///
    /// The batch must become visible all at once or not at all.
    fn append_batch(&self, user: &UserId, transactions: Vec<Transaction>) -> Result<()>;

    /// Snapshot of a user's ledger in insertion order (empty if unknown)
    fn transactions(&self, user: &UserId) -> Result<Vec<Transaction>>;

    /// Append a single transaction
    fn append(&self, user: &UserId, transaction: Transaction) -> Result<()> {
        self.append_batch(user, vec![transaction])
    }
}

/// In-memory store, lives for the process lifetime
#[derive(Debug, Default)]
pub struct MemoryStore {
    ledgers: DashMap<UserId, Vec<Transaction>>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }
}

impl TransactionStore for MemoryStore {
    fn append_batch(&self, user: &UserId, transactions: Vec<Transaction>) -> Result<()> {
        let count = transactions.len();

        // The entry guard holds the shard lock for the whole batch
        self.ledgers
            .entry(user.clone())
            .or_default()
            .extend(transactions);

        tracing::debug!(user = %user, count, "Transactions appended");
        Ok(())
    }

    fn transactions(&self, user: &UserId) -> Result<Vec<Transaction>> {
        let ledger = self.ledgers.entry(user.clone()).or_default();
        Ok(ledger.value().clone())
    }
}
