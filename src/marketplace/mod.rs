//! Marketplace integrations.
//!
//! Defines the `LendingMarketplace` trait and the LendingClub-style HTTP
//! implementation. This is the only part of the agent that performs I/O.

pub mod lending_club;

use async_trait::async_trait;

use crate::types::{AccountSummary, InvestError, Loan, Order, OrderConfirmation};

/// Abstraction over a peer-lending note marketplace.
///
/// Every call is a single request/response. Implementations must not retry
/// or cache; failures surface as `InvestError::Transport`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LendingMarketplace: Send + Sync {
    /// Fetch current listings. `show_all` returns the full listing set,
    /// otherwise only loans listed since the marketplace's own cursor.
    async fn fetch_listings(&self, show_all: bool, token: &str) -> Result<Vec<Loan>, InvestError>;

    /// Submit an order. The confirmation has exactly one line per order
    /// line, in order.
    async fn submit_order(
        &self,
        order: &Order,
        token: &str,
    ) -> Result<OrderConfirmation, InvestError>;

    /// Cash and total value for an account. Used during account setup.
    async fn account_summary(
        &self,
        account_id: &str,
        token: &str,
    ) -> Result<AccountSummary, InvestError>;

    /// Loan ids of notes the account already holds. Used during account setup.
    async fn owned_loan_ids(&self, account_id: &str, token: &str) -> Result<Vec<u64>, InvestError>;
}
