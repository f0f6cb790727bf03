//! Input validation for transactions and spend requests
//!
//! Requests arrive as loosely typed JSON values. Validation turns them into
//! typed values or a [`ValidationError`] naming the offending field; it never
//! touches the ledger.

use crate::types::PayerId;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use thiserror::Error;

/// Request field that failed validation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Field {
    /// `payer`
    Payer,
    /// `points`
    Points,
    /// `timestamp`
    Timestamp,
}

impl Field {
    /// Field name as it appears in requests
    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Payer => "payer",
            Field::Points => "points",
            Field::Timestamp => "timestamp",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validation failure for a single field
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct ValidationError {
    /// Field that failed
    pub field: Field,
    /// Human readable reason
    pub message: String,
}

impl ValidationError {
    /// Create a validation error for `field`
    pub fn new(field: Field, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }

    fn payer() -> Self {
        Self::new(Field::Payer, "Parameter 'payer' must be a non-empty string")
    }

    fn timestamp() -> Self {
        Self::new(Field::Timestamp, "Parameter 'timestamp' must be an ISO timestamp")
    }

    fn points() -> Self {
        Self::new(Field::Points, "Parameter 'points' must be a whole number")
    }

    pub(crate) fn points_overflow() -> Self {
        Self::new(Field::Points, "Parameter 'points' would overflow the payer's balance")
    }
}

/// Raw transaction as submitted by a caller
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransactionRequest {
    /// Expected: non-empty string
    #[serde(default)]
    pub payer: Value,

    /// Expected: integral number
    #[serde(default)]
    pub points: Value,

    /// Expected: ISO 8601 timestamp string
    #[serde(default)]
    pub timestamp: Value,
}

impl TransactionRequest {
    /// Build a request from already typed parts
    pub fn new(payer: impl Into<String>, points: i64, timestamp: impl Into<String>) -> Self {
        Self {
            payer: Value::String(payer.into()),
            points: Value::from(points),
            timestamp: Value::String(timestamp.into()),
        }
    }

    /// Validate in the order payer, timestamp, points; first failure wins
    pub fn validate(&self) -> Result<NewTransaction, ValidationError> {
        let payer = match &self.payer {
            Value::String(s) if !s.is_empty() => PayerId::new(s.clone()),
            _ => return Err(ValidationError::payer()),
        };

        let timestamp = match &self.timestamp {
            Value::String(s) => parse_timestamp(s)?,
            _ => return Err(ValidationError::timestamp()),
        };

        let points = parse_points(&self.points)?;

        Ok(NewTransaction {
            payer,
            points,
            timestamp,
        })
    }
}

/// Validated transaction, ready to append
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTransaction {
    /// Payer granting or revoking points
    pub payer: PayerId,
    /// Signed delta
    pub points: i64,
    /// When the points were granted
    pub timestamp: DateTime<Utc>,
}

/// Raw spend request as submitted by a caller
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SpendRequest {
    /// Expected: non-negative integral number
    #[serde(default)]
    pub points: Value,
}

impl SpendRequest {
    /// Validate the requested amount
    pub fn validate(&self) -> Result<i64, ValidationError> {
        let points = parse_points(&self.points)?;
        check_spend_amount(points)
    }
}

/// Spend amounts must not be negative; zero is a no-op
pub fn check_spend_amount(points: i64) -> Result<i64, ValidationError> {
    if points < 0 {
        return Err(ValidationError::new(
            Field::Points,
            "Parameter 'points' must not be negative",
        ));
    }
    Ok(points)
}

/// Parse an integral JSON number; `100.0` is accepted, `1.5` is not
pub fn parse_points(value: &Value) -> Result<i64, ValidationError> {
    let Value::Number(n) = value else {
        return Err(ValidationError::points());
    };

    if let Some(i) = n.as_i64() {
        return Ok(i);
    }

    match n.as_f64() {
        Some(f) if f.is_finite() && f.fract() == 0.0 && f.abs() < i64::MAX as f64 => Ok(f as i64),
        _ => Err(ValidationError::points()),
    }
}

/// Parse RFC 3339, naive ISO date-time (as UTC) or a bare date (midnight UTC)
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, ValidationError> {
    let raw = raw.trim();

    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }

    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(naive.and_utc());
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .ok_or_else(ValidationError::timestamp)
}
