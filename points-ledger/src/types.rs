//! Core types for the points ledger
//!
//! All types are designed for:
//! - Cheap cloning into planner snapshots
//! - Plain JSON rendering (identifiers serialize as bare strings)
//! - Integer arithmetic (points are whole numbers)

use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

/// User identifier (one ledger per user)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Create new user ID
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get as string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Payer identifier (the entity granting or revoking points)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PayerId(String);

impl PayerId {
    /// Create new payer ID
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get as string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Per-payer balances, derived from a user's transactions
pub type Balances = BTreeMap<PayerId, i64>;

/// One signed point delta from a payer at a point in time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Unique transaction ID (UUIDv7 for time-ordering)
    pub transaction_id: Uuid,

    /// Payer that granted (or revoked) the points
    pub payer: PayerId,

    /// Signed point delta (zero is allowed)
    pub points: i64,

    /// When the points were granted, not when they were recorded
    pub timestamp: DateTime<Utc>,

    /// Bookkeeping only; the planner recomputes neutralization every time
    #[serde(default)]
    pub spent: i64,
}

impl Transaction {
    /// Create a fresh transaction with `spent = 0`
    pub fn new(payer: PayerId, points: i64, timestamp: DateTime<Utc>) -> Self {
        Self {
            transaction_id: Uuid::now_v7(),
            payer,
            points,
            timestamp,
            spent: 0,
        }
    }
}

/// A per-payer delta, either planned or committed by a spend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Allocation {
    /// Payer the delta applies to
    pub payer: PayerId,

    /// Delta in points (never positive for spends)
    pub points: i64,
}

/// Fold transactions into per-payer balances
///
/// Fails with [`Error::Storage`] if a payer's running sum leaves the `i64`
/// range; writes are checked so a stored history never does.
pub fn fold_balances<'a>(transactions: impl IntoIterator<Item = &'a Transaction>) -> Result<Balances> {
    let mut balances = Balances::new();
    for tx in transactions {
        let balance = balances.entry(tx.payer.clone()).or_insert(0);
        *balance = balance.checked_add(tx.points).ok_or_else(|| {
            Error::Storage(format!("Balance overflow for payer {}", tx.payer))
        })?;
    }
    Ok(balances)
}
