//! LendingClub investor API client.
//!
//! Base URL: https://api.lendingclub.com/api/investor/v1
//! Auth: `Authorization: {token}` on every request.
//!
//! Listing and order endpoints are used by the investment loop; summary
//! and detailed-notes endpoints only during account setup.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, info};

use super::LendingMarketplace;
use crate::types::{
    AccountSummary, InvestError, ListingPage, Loan, Order, OrderConfirmation, OwnedNotesPage,
};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

pub const DEFAULT_BASE_URL: &str = "https://api.lendingclub.com/api/investor/v1";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

pub struct LendingClubClient {
    http: Client,
    base_url: String,
}

impl LendingClubClient {
    /// Create a client against `base_url` (defaults to the production API).
    pub fn new(base_url: Option<String>, timeout: Option<Duration>) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout.unwrap_or(Duration::from_secs(DEFAULT_TIMEOUT_SECS)))
            .user_agent("autoinvest/0.1.0")
            .build()
            .context("Failed to build HTTP client for LendingClub")?;

        let base_url = base_url
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // -- URL helpers -----------------------------------------------------

    /// Listing URL for this cycle. Computed per call, never stored.
    pub fn listings_url(&self, show_all: bool) -> String {
        format!("{}/loans/listing?showAll={show_all}", self.base_url)
    }

    pub fn orders_url(&self, aid: u64) -> String {
        format!("{}/accounts/{aid}/orders", self.base_url)
    }

    fn account_url(&self, account_id: &str, resource: &str) -> String {
        format!("{}/accounts/{account_id}/{resource}", self.base_url)
    }

    // -- Internal helpers ------------------------------------------------

    /// Send a request and return the body of a 2xx response.
    async fn send(
        &self,
        request: RequestBuilder,
        token: &str,
        operation: &str,
    ) -> Result<String, InvestError> {
        let resp = request
            .header(reqwest::header::AUTHORIZATION, token)
            .send()
            .await
            .map_err(|e| InvestError::transport(operation, e))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| InvestError::transport(operation, e))?;

        if !status.is_success() {
            return Err(InvestError::transport(operation, format!("{status}: {body}")));
        }

        Ok(body)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        token: &str,
        operation: &str,
    ) -> Result<T, InvestError> {
        debug!(url = %url, "GET");
        let body = self.send(self.http.get(url), token, operation).await?;
        parse_body(&body, operation)
    }
}

/// Deserialize a response body. A malformed body is a transport failure.
fn parse_body<T: DeserializeOwned>(body: &str, operation: &str) -> Result<T, InvestError> {
    serde_json::from_str(body)
        .map_err(|e| InvestError::transport(operation, format!("malformed response: {e}")))
}

/// Parse an order confirmation and check it lines up with the order.
///
/// Fails closed: a confirmation that does not account for every requested
/// line, in order, is rejected as a whole rather than partially applied.
pub fn parse_confirmation(order: &Order, body: &str) -> Result<OrderConfirmation, InvestError> {
    const OPERATION: &str = "submit order";

    let confirmation: OrderConfirmation = parse_body(body, OPERATION)?;

    if confirmation.order_confirmations.len() != order.orders.len() {
        return Err(InvestError::transport(
            OPERATION,
            format!(
                "expected {} confirmation lines, got {}",
                order.orders.len(),
                confirmation.order_confirmations.len()
            ),
        ));
    }

    let mismatched = order
        .loan_ids()
        .zip(confirmation.order_confirmations.iter().map(|c| c.loan_id))
        .find(|(requested, confirmed)| requested != confirmed);

    if let Some((requested, confirmed)) = mismatched {
        return Err(InvestError::transport(
            OPERATION,
            format!("confirmation for loan {confirmed} where loan {requested} was requested"),
        ));
    }

    Ok(confirmation)
}

// ---------------------------------------------------------------------------
// LendingMarketplace trait implementation
// ---------------------------------------------------------------------------

#[async_trait]
impl LendingMarketplace for LendingClubClient {
    async fn fetch_listings(&self, show_all: bool, token: &str) -> Result<Vec<Loan>, InvestError> {
        let url = self.listings_url(show_all);
        let page: ListingPage = self.get_json(&url, token, "fetch listings").await?;

        debug!(
            show_all,
            count = page.loans.len(),
            as_of = ?page.as_of_date,
            "Listings fetched"
        );

        Ok(page.loans)
    }

    async fn submit_order(
        &self,
        order: &Order,
        token: &str,
    ) -> Result<OrderConfirmation, InvestError> {
        let url = self.orders_url(order.aid);

        info!(
            aid = order.aid,
            lines = order.orders.len(),
            loans = ?order.loan_ids().collect::<Vec<_>>(),
            "Submitting order"
        );

        let body = self
            .send(self.http.post(&url).json(order), token, "submit order")
            .await?;

        parse_confirmation(order, &body)
    }

    async fn account_summary(
        &self,
        account_id: &str,
        token: &str,
    ) -> Result<AccountSummary, InvestError> {
        let url = self.account_url(account_id, "summary");
        self.get_json(&url, token, "account summary").await
    }

    async fn owned_loan_ids(&self, account_id: &str, token: &str) -> Result<Vec<u64>, InvestError> {
        let url = self.account_url(account_id, "detailednotes");
        let page: OwnedNotesPage = self.get_json(&url, token, "detailed notes").await?;
        Ok(page.my_notes.into_iter().map(|n| n.loan_id).collect())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
