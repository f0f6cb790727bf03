//! Spending planner
//!
//! Pure function from a ledger snapshot and a requested amount to a per-payer
//! allocation of negative deltas.
//!
//! # Algorithm
//!
//! 1. Stable sort by timestamp (ties keep insertion order)
//! 2. Neutralization: positive transactions become chunks; a negative
//!    transaction eats into the same payer's earlier chunks, earliest first.
//!    Whatever it cannot absorb is dropped.
//! 3. Spend: walk the chunks oldest first and take `min(remaining, chunk)`
//!    from each until the request is covered.
//!
//! Chunks live in an arena with per-payer index lists; stored transactions are
//! never touched.

use crate::types::{Allocation, PayerId, Transaction};
use std::collections::HashMap;

/// Spendable slice of a positive transaction, net of later corrections
#[derive(Debug, Clone)]
struct Chunk<'a> {
    payer: &'a PayerId,
    remaining: i64,
}

/// Per-payer deltas in first-touch order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpendingPlan {
    entries: Vec<Allocation>,
}

impl SpendingPlan {
    /// Planned deltas, in the order payers were first touched
    pub fn allocations(&self) -> &[Allocation] {
        &self.entries
    }

    /// Consume into the planned deltas
    pub fn into_allocations(self) -> Vec<Allocation> {
        self.entries
    }

    /// Delta planned for `payer`, if the payer was touched
    pub fn delta(&self, payer: &PayerId) -> Option<i64> {
        self.entries
            .iter()
            .find(|a| &a.payer == payer)
            .map(|a| a.points)
    }

    /// Total points covered by the plan (non-negative)
    pub fn total_spent(&self) -> i64 {
        -self.entries.iter().map(|a| a.points).sum::<i64>()
    }

    /// True if no payer was touched
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Subtract `points` from `payer`, registering the payer on first touch
    fn debit(&mut self, payer: &PayerId, points: i64) {
        match self.entries.iter_mut().find(|a| &a.payer == payer) {
            Some(entry) => entry.points -= points,
            None => self.entries.push(Allocation {
                payer: payer.clone(),
                points: -points,
            }),
        }
    }
}

/// Build chunks from the sorted snapshot, netting out corrections
fn neutralize<'a>(sorted: &[&'a Transaction]) -> Vec<Chunk<'a>> {
    let mut chunks: Vec<Chunk<'a>> = Vec::new();
    let mut by_payer: HashMap<&'a PayerId, Vec<usize>> = HashMap::new();

    for &tx in sorted {
        if tx.points > 0 {
            by_payer.entry(&tx.payer).or_default().push(chunks.len());
            chunks.push(Chunk {
                payer: &tx.payer,
                remaining: tx.points,
            });
        } else if tx.points < 0 {
            let mut left = tx.points.saturating_neg();
            let Some(indices) = by_payer.get(&tx.payer) else {
                continue;
            };

            for &idx in indices {
                if left <= 0 {
                    break;
                }
                let chunk = &mut chunks[idx];
                let take = left.min(chunk.remaining);
                left -= take;
                chunk.remaining -= take;
            }
            // excess correction is dropped, not carried forward
        }
    }

    chunks
}

/// Plan a deduction of up to `points` across payers, oldest points first
pub fn create_spending_plan(transactions: &[Transaction], points: i64) -> SpendingPlan {
    let mut sorted: Vec<&Transaction> = transactions.iter().collect();
    sorted.sort_by_key(|tx| tx.timestamp);

    let chunks = neutralize(&sorted);

    let mut plan = SpendingPlan::default();
    let mut remaining = points;
    for chunk in &chunks {
        if remaining <= 0 {
            break;
        }
        let spend_now = remaining.min(chunk.remaining);
        remaining -= spend_now;
        plan.debit(chunk.payer, spend_now);
    }

    plan
}

/// Points spendable right now, i.e. the sum of all chunks after neutralization
///
/// Saturates at `i64::MAX`; no request can exceed that anyway.
pub fn available_points(transactions: &[Transaction]) -> i64 {
    let mut sorted: Vec<&Transaction> = transactions.iter().collect();
    sorted.sort_by_key(|tx| tx.timestamp);

    neutralize(&sorted)
        .iter()
        .fold(0i64, |total, c| total.saturating_add(c.remaining))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2020, 10, day, hour, 0, 0).unwrap()
    }

    fn tx(payer: &str, points: i64, timestamp: DateTime<Utc>) -> Transaction {
        Transaction::new(PayerId::new(payer), points, timestamp)
    }

    fn payer(name: &str) -> PayerId {
        PayerId::new(name)
    }

    #[test]
    fn test_empty_ledger_plans_nothing() {
        let plan = create_spending_plan(&[], 100);
        assert!(plan.is_empty());
        assert_eq!(plan.total_spent(), 0);
    }

    #[test]
    fn test_oldest_points_first() {
        let txs = vec![
            tx("UNILEVER", 200, at(31, 11)),
            tx("DANNON", 300, at(31, 10)),
        ];

        let plan = create_spending_plan(&txs, 350);
        assert_eq!(
            plan.allocations(),
            &[
                Allocation { payer: payer("DANNON"), points: -300 },
                Allocation { payer: payer("UNILEVER"), points: -50 },
            ]
        );
        assert_eq!(plan.total_spent(), 350);
    }

    #[test]
    fn test_retroactive_correction_neutralizes_earlier_chunk() {
        let txs = vec![
            tx("DANNON", 300, at(31, 10)),
            tx("UNILEVER", 200, at(31, 11)),
            tx("DANNON", -100, at(31, 15)),
        ];

        let plan = create_spending_plan(&txs, 350);
        assert_eq!(plan.delta(&payer("DANNON")), Some(-200));
        assert_eq!(plan.delta(&payer("UNILEVER")), Some(-150));
    }

    #[test]
    fn test_correction_spans_several_chunks() {
        let txs = vec![
            tx("DANNON", 100, at(1, 10)),
            tx("DANNON", 100, at(2, 10)),
            tx("UNILEVER", 100, at(3, 10)),
            tx("DANNON", -150, at(4, 10)),
        ];

        assert_eq!(available_points(&txs), 150);

        let plan = create_spending_plan(&txs, 150);
        assert_eq!(
            plan.allocations(),
            &[
                Allocation { payer: payer("DANNON"), points: -50 },
                Allocation { payer: payer("UNILEVER"), points: -100 },
            ]
        );
    }

    #[test]
    fn test_correction_before_any_grant_is_dropped() {
        let txs = vec![
            tx("DANNON", -500, at(1, 10)),
            tx("DANNON", 100, at(2, 10)),
        ];

        // Only earlier chunks are neutralized, so the later grant is untouched
        assert_eq!(available_points(&txs), 100);
        assert_eq!(create_spending_plan(&txs, 100).total_spent(), 100);
    }

    #[test]
    fn test_excess_correction_is_dropped() {
        let txs = vec![
            tx("DANNON", 100, at(1, 10)),
            tx("DANNON", -400, at(2, 10)),
            tx("DANNON", 50, at(3, 10)),
        ];

        assert_eq!(available_points(&txs), 50);
    }

    #[test]
    fn test_available_points_saturates() {
        let txs = vec![
            tx("DANNON", i64::MAX, at(1, 10)),
            tx("UNILEVER", i64::MAX, at(2, 10)),
        ];

        assert_eq!(available_points(&txs), i64::MAX);
        let plan = create_spending_plan(&txs, i64::MAX);
        assert_eq!(plan.total_spent(), i64::MAX);
        assert_eq!(plan.delta(&payer("UNILEVER")), None);
    }

    #[test]
    fn test_touched_payer_with_nothing_left_appears_with_zero() {
        let txs = vec![
            tx("DANNON", 100, at(1, 10)),
            tx("DANNON", -100, at(2, 10)),
            tx("UNILEVER", 100, at(3, 10)),
        ];

        let plan = create_spending_plan(&txs, 60);
        assert_eq!(
            plan.allocations(),
            &[
                Allocation { payer: payer("DANNON"), points: 0 },
                Allocation { payer: payer("UNILEVER"), points: -60 },
            ]
        );
    }

    #[test]
    fn test_zero_point_transactions_are_ignored() {
        let txs = vec![tx("DANNON", 0, at(1, 10)), tx("UNILEVER", 10, at(2, 10))];

        let plan = create_spending_plan(&txs, 10);
        assert_eq!(plan.delta(&payer("DANNON")), None);
        assert_eq!(plan.delta(&payer("UNILEVER")), Some(-10));
    }

    #[test]
    fn test_equal_timestamps_keep_insertion_order() {
        let ts = at(1, 10);
        let txs = vec![tx("B", 10, ts), tx("A", 10, ts), tx("C", 10, ts)];

        let plan = create_spending_plan(&txs, 15);
        assert_eq!(
            plan.allocations(),
            &[
                Allocation { payer: payer("B"), points: -10 },
                Allocation { payer: payer("A"), points: -5 },
            ]
        );
    }

    #[test]
    fn test_partial_plan_when_short() {
        let txs = vec![tx("DANNON", 100, at(1, 10))];

        let plan = create_spending_plan(&txs, 250);
        assert_eq!(plan.total_spent(), 100);
    }

    #[test]
    fn test_non_positive_request_plans_nothing() {
        let txs = vec![tx("DANNON", 100, at(1, 10))];

        assert!(create_spending_plan(&txs, 0).is_empty());
        assert!(create_spending_plan(&txs, -5).is_empty());
    }

    #[test]
    fn test_snapshot_is_not_mutated() {
        let txs = vec![tx("DANNON", 100, at(1, 10)), tx("DANNON", -40, at(2, 10))];
        let before = txs.clone();

        let _ = create_spending_plan(&txs, 60);
        assert_eq!(txs, before);
    }
}
