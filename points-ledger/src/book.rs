//! Synchronous ledger operations
//!
//! [`PointsBook`] validates, plans and commits against a [`TransactionStore`].
//! It does no locking of its own; the actor owns it and runs one operation at a
//! time, which makes plan-then-commit a critical section.

use crate::{
    metrics::Metrics,
    planner::{self, SpendingPlan},
    store::TransactionStore,
    types::{fold_balances, Allocation, Balances, Transaction, UserId},
    validation::{check_spend_amount, TransactionRequest, ValidationError},
    Error, Result,
};
use chrono::Utc;
use std::sync::Arc;
use std::time::Instant;

/// Ledger operations over an injected store
pub struct PointsBook {
    store: Arc<dyn TransactionStore>,
    metrics: Metrics,
}

impl PointsBook {
    /// Create a book over `store`, recording into `metrics`
    pub fn new(store: Arc<dyn TransactionStore>, metrics: Metrics) -> Self {
        Self { store, metrics }
    }

    /// Validate and append a transaction
    ///
    /// A transaction that would push its payer's balance outside `i64` is
    /// rejected on `points`.
    pub fn add_transaction(&self, user: &UserId, request: &TransactionRequest) -> Result<()> {
        let tx = request.validate().map_err(|err| self.reject(user, err))?;

        let balance = self
            .balances(user)?
            .get(&tx.payer)
            .copied()
            .unwrap_or(0);
        if balance.checked_add(tx.points).is_none() {
            return Err(self.reject(user, ValidationError::points_overflow()));
        }

        tracing::debug!(
            user = %user,
            payer = %tx.payer,
            points = tx.points,
            timestamp = %tx.timestamp,
            "Adding transaction"
        );

        self.store
            .append(user, Transaction::new(tx.payer, tx.points, tx.timestamp))?;
        self.metrics.record_transaction(1);
        Ok(())
    }

    fn reject(&self, user: &UserId, err: ValidationError) -> Error {
        self.metrics.record_validation_failure();
        tracing::warn!(user = %user, field = %err.field, "Transaction rejected: {}", err);
        err.into()
    }

    /// Per-payer balances
    pub fn balances(&self, user: &UserId) -> Result<Balances> {
        let transactions = self.store.transactions(user)?;
        fold_balances(&transactions)
    }

    /// Full history in insertion order
    pub fn transactions(&self, user: &UserId) -> Result<Vec<Transaction>> {
        self.store.transactions(user)
    }

    /// Read-only spending plan for `points`
    pub fn plan(&self, user: &UserId, points: i64) -> Result<SpendingPlan> {
        let transactions = self.store.transactions(user)?;
        Ok(planner::create_spending_plan(&transactions, points))
    }

    /// Plan, check coverage, then commit one negative transaction per payer
    pub fn spend(&self, user: &UserId, points: i64) -> Result<Vec<Allocation>> {
        let points = check_spend_amount(points).map_err(|err| {
            self.metrics.record_validation_failure();
            Error::from(err)
        })?;

        let started = Instant::now();
        let transactions = self.store.transactions(user)?;
        let plan = planner::create_spending_plan(&transactions, points);
        let total_spent = plan.total_spent();

        if total_spent < points {
            self.metrics.record_spend_rejected();
            tracing::warn!(
                user = %user,
                requested = points,
                available = total_spent,
                "Spend rejected"
            );
            return Err(Error::InsufficientPoints {
                requested: points,
                available: total_spent,
            });
        }

        let allocations = plan.into_allocations();
        let balances = fold_balances(&transactions)?;
        for allocation in &allocations {
            let balance = balances.get(&allocation.payer).copied().unwrap_or(0);
            if balance.checked_add(allocation.points).is_none() {
                self.metrics.record_spend_rejected();
                return Err(Error::Storage(format!(
                    "Balance overflow for payer {}",
                    allocation.payer
                )));
            }
        }

        let now = Utc::now();
        let batch: Vec<Transaction> = allocations
            .iter()
            .map(|a| Transaction::new(a.payer.clone(), a.points, now))
            .collect();

        self.store.append_batch(user, batch)?;

        self.metrics.record_transaction(allocations.len());
        self.metrics
            .record_spend(total_spent, started.elapsed().as_secs_f64());
        tracing::info!(
            user = %user,
            points = total_spent,
            payers = allocations.len(),
            "Spend committed"
        );

        Ok(allocations)
    }
}

impl std::fmt::Debug for PointsBook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PointsBook").finish_non_exhaustive()
    }
}
