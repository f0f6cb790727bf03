//! Actor-based concurrency for the ledger
//!
//! This module implements the single-writer pattern using Tokio actors:
//! - One task owns the [`PointsBook`], so plan-then-commit never interleaves
//! - Async message passing with backpressure (bounded mailbox)
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │                HTTP handlers (axum)                   │
//! └─────────────────────┬────────────────────────────────┘
//!                       │
//!                       ▼
//! ┌──────────────────────────────────────────────────────┐
//! │               LedgerHandle (Clone)                    │
//! │         Sends messages to actor mailbox              │
//! └─────────────────────┬────────────────────────────────┘
//!                       │
//!                       │ mpsc::channel (bounded)
//!                       ▼
//! ┌──────────────────────────────────────────────────────┐
//! │              LedgerActor (Single Task)                │
//! │      validate → plan → check → append_batch          │
//! └───────────────────────────────────────────────────────┘
//! ```

use crate::{
    book::PointsBook,
    planner::SpendingPlan,
    types::{Allocation, Balances, Transaction, UserId},
    validation::TransactionRequest,
    Error, Result,
};
use tokio::sync::{mpsc, oneshot};

/// Message sent to the ledger actor
#[derive(Debug)]
pub enum LedgerMessage {
    /// Validate and append a transaction
    AddTransaction {
        user: UserId,
        request: TransactionRequest,
        response: oneshot::Sender<Result<()>>,
    },

    /// Get per-payer balances
    GetBalances {
        user: UserId,
        response: oneshot::Sender<Result<Balances>>,
    },

    /// Get transaction history
    GetTransactions {
        user: UserId,
        response: oneshot::Sender<Result<Vec<Transaction>>>,
    },

    /// Compute a spending plan without committing it
    Plan {
        user: UserId,
        points: i64,
        response: oneshot::Sender<Result<SpendingPlan>>,
    },

    /// Plan and commit a spend
    Spend {
        user: UserId,
        points: i64,
        response: oneshot::Sender<Result<Vec<Allocation>>>,
    },

    /// Shutdown actor
    Shutdown,
}

/// Actor that processes ledger messages
#[derive(Debug)]
pub struct LedgerActor {
    /// Ledger operations
    book: PointsBook,

    /// Mailbox for incoming messages
    mailbox: mpsc::Receiver<LedgerMessage>,
}

impl LedgerActor {
    /// Create new actor
    pub fn new(book: PointsBook, mailbox: mpsc::Receiver<LedgerMessage>) -> Self {
        Self { book, mailbox }
    }

    /// Run the actor event loop until shutdown or until every handle is dropped
    pub async fn run(mut self) {
        while let Some(msg) = self.mailbox.recv().await {
            if let LedgerMessage::Shutdown = msg {
                tracing::info!("Ledger actor shutting down");
                break;
            }
            self.handle_message(msg);
        }
    }

    /// Handle a single message
    fn handle_message(&mut self, msg: LedgerMessage) {
        match msg {
            LedgerMessage::AddTransaction {
                user,
                request,
                response,
            } => {
                let _ = response.send(self.book.add_transaction(&user, &request));
            }

            LedgerMessage::GetBalances { user, response } => {
                let _ = response.send(self.book.balances(&user));
            }

            LedgerMessage::GetTransactions { user, response } => {
                let _ = response.send(self.book.transactions(&user));
            }

            LedgerMessage::Plan {
                user,
                points,
                response,
            } => {
                let _ = response.send(self.book.plan(&user, points));
            }

            LedgerMessage::Spend {
                user,
                points,
                response,
            } => {
                let result = self.book.spend(&user, points);
                if let Err(ref e) = result {
                    if !e.is_client_error() {
                        tracing::error!(user = %user, "Spend failed: {}", e);
                    }
                }
                let _ = response.send(result);
            }

            LedgerMessage::Shutdown => {
                // Handled in run loop
            }
        }
    }
}

/// Handle for sending messages to the actor
#[derive(Clone, Debug)]
pub struct LedgerHandle {
    sender: mpsc::Sender<LedgerMessage>,
}

impl LedgerHandle {
    /// Create new handle
    pub fn new(sender: mpsc::Sender<LedgerMessage>) -> Self {
        Self { sender }
    }

    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<Result<T>>) -> LedgerMessage,
    ) -> Result<T> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(build(tx))
            .await
            .map_err(|_| Error::Concurrency("Actor mailbox closed".to_string()))?;

        rx.await
            .map_err(|_| Error::Concurrency("Response channel closed".to_string()))?
    }

    /// Validate and append a transaction
    pub async fn add_transaction(&self, user: UserId, request: TransactionRequest) -> Result<()> {
        self.request(|response| LedgerMessage::AddTransaction {
            user,
            request,
            response,
        })
        .await
    }

    /// Get per-payer balances
    pub async fn get_balances(&self, user: UserId) -> Result<Balances> {
        self.request(|response| LedgerMessage::GetBalances { user, response })
            .await
    }

    /// Get transaction history
    pub async fn get_transactions(&self, user: UserId) -> Result<Vec<Transaction>> {
        self.request(|response| LedgerMessage::GetTransactions { user, response })
            .await
    }

    /// Compute a spending plan without committing it
    pub async fn plan(&self, user: UserId, points: i64) -> Result<SpendingPlan> {
        self.request(|response| LedgerMessage::Plan {
            user,
            points,
            response,
        })
        .await
    }

    /// Plan and commit a spend
    pub async fn spend(&self, user: UserId, points: i64) -> Result<Vec<Allocation>> {
        self.request(|response| LedgerMessage::Spend {
            user,
            points,
            response,
        })
        .await
    }

    /// Shutdown actor
    pub async fn shutdown(&self) -> Result<()> {
        self.sender
            .send(LedgerMessage::Shutdown)
            .await
            .map_err(|_| Error::Concurrency("Actor mailbox closed".to_string()))?;
        Ok(())
    }
}

/// Spawn the ledger actor
pub fn spawn_ledger_actor(book: PointsBook, mailbox_capacity: usize) -> LedgerHandle {
    let (tx, rx) = mpsc::channel(mailbox_capacity.max(1)); // Bounded channel for backpressure
    let actor = LedgerActor::new(book, rx);

    tokio::spawn(async move {
        actor.run().await;
    });

    LedgerHandle::new(tx)
}
