//! Order builder.
//!
//! Turns the ranked selection into a purchase order payload.

use rust_decimal::Decimal;

use crate::types::{InvestError, Loan, Order, OrderLine};

/// Build an order requesting `amount_per_loan` for every selected loan,
/// in selection order, with no portfolio assignment.
///
/// The marketplace expects a numeric account id; anything else is a
/// configuration error and is returned as `InvalidAccountIdentifier`.
pub fn build_order(
    loans: &[Loan],
    amount_per_loan: Decimal,
    account_id: &str,
) -> Result<Order, InvestError> {
    let aid = account_id
        .parse::<u64>()
        .map_err(|_| InvestError::InvalidAccountIdentifier(account_id.to_string()))?;

    let orders = loans
        .iter()
        .map(|loan| OrderLine {
            loan_id: loan.id,
            requested_amount: amount_per_loan,
            portfolio_id: None,
        })
        .collect();

    Ok(Order { aid, orders })
}
