//! Shared types for the autoinvest agent.
//!
//! Wire-level shapes (listings, orders, confirmations) live here so that
//! the strategy, engine, and marketplace modules can depend on them without
//! circular references.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Loan listing
// ---------------------------------------------------------------------------

/// A loan currently listed on the marketplace.
///
/// Immutable snapshot for one polling cycle; only the fields the filter
/// needs are deserialized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Loan {
    pub id: u64,
    pub grade: String,
    /// Interest rate in percent (13.56 = 13.56%).
    pub int_rate: Decimal,
    /// Term in months.
    pub term: u32,
    pub purpose: String,
    pub addr_state: String,
    pub annual_inc: Decimal,
    /// `None` when the borrower has never been delinquent.
    #[serde(default)]
    pub mths_since_last_delinq: Option<u32>,
    #[serde(default)]
    pub inq_last6_mths: u32,
    pub loan_amount: Decimal,
    pub revol_bal: Decimal,
}

impl fmt::Display for Loan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "loan {} [{} {:.2}% {}m {} {}]",
            self.id, self.grade, self.int_rate, self.term, self.purpose, self.addr_state,
        )
    }
}

/// Body of `GET /loans/listing`. The marketplace omits `loans` entirely
/// when nothing new has been listed.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingPage {
    #[serde(default)]
    pub as_of_date: Option<String>,
    #[serde(default)]
    pub loans: Vec<Loan>,
}

// ---------------------------------------------------------------------------
// Order
// ---------------------------------------------------------------------------

/// A purchase order for one account. Never mutated after submission.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Order {
    pub aid: u64,
    pub orders: Vec<OrderLine>,
}

impl Order {
    pub fn loan_ids(&self) -> impl Iterator<Item = u64> + '_ {
        self.orders.iter().map(|line| line.loan_id)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    pub loan_id: u64,
    pub requested_amount: Decimal,
    pub portfolio_id: Option<u64>,
}

// ---------------------------------------------------------------------------
// Order confirmation
// ---------------------------------------------------------------------------

/// Marketplace response to a submitted order, one line per requested loan.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderConfirmation {
    #[serde(default)]
    pub order_instruct_id: Option<u64>,
    #[serde(default)]
    pub order_confirmations: Vec<ConfirmationLine>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmationLine {
    pub loan_id: u64,
    #[serde(default)]
    pub requested_amount: Option<Decimal>,
    /// Absent or negative means the line was rejected.
    #[serde(default)]
    pub invested_amount: Option<Decimal>,
    #[serde(default)]
    pub execution_status: Vec<String>,
}

impl ConfirmationLine {
    /// Zero is a valid fill; only a negative or missing amount is a rejection.
    pub fn is_purchased(&self) -> bool {
        matches!(self.invested_amount, Some(amount) if amount >= Decimal::ZERO)
    }
}

// ---------------------------------------------------------------------------
// Account setup responses
// ---------------------------------------------------------------------------

/// Body of `GET /accounts/{id}/summary`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountSummary {
    #[serde(default)]
    pub investor_id: Option<u64>,
    pub available_cash: Decimal,
    pub account_total: Decimal,
}

/// Body of `GET /accounts/{id}/detailednotes`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnedNotesPage {
    #[serde(default)]
    pub my_notes: Vec<OwnedNote>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnedNote {
    pub loan_id: u64,
    #[serde(default)]
    pub note_id: Option<u64>,
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Failures that terminate an account's investment loop.
#[derive(Debug, thiserror::Error)]
pub enum InvestError {
    /// Network, HTTP status, or response-body failure. Never retried.
    #[error("Transport error during {operation}: {message}")]
    Transport { operation: String, message: String },

    #[error("Invalid account identifier: {0:?}")]
    InvalidAccountIdentifier(String),
}

impl InvestError {
    pub fn transport(operation: &str, message: impl fmt::Display) -> Self {
        InvestError::Transport {
            operation: operation.to_string(),
            message: message.to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
