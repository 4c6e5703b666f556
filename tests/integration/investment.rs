//! End-to-end investment scenarios against the mock marketplace.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use secrecy::SecretString;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio_test::assert_ok;

use autoinvest::account::Account;
use autoinvest::config::{AccountConfig, AppConfig, FilterConfig};
use autoinvest::engine::investor::{CycleOutcome, Investor, StopReason};
use autoinvest::engine::scheduler::{Deadline, RunSettings, Scheduler};
use autoinvest::marketplace::LendingMarketplace;
use autoinvest::setup;
use autoinvest::types::{InvestError, Loan};

use crate::mock_marketplace::{eligible_loan, MockMarketplace};

fn make_account(id: &str, token: &str, cash: Decimal) -> Account {
    Account::new(
        id,
        format!("acct-{id}"),
        SecretString::new(token.to_string()),
        cash,
        dec!(25),
        setup::criteria(
            &FilterConfig::default(),
            &["B".to_string(), "C".to_string()],
            vec!["CA".to_string(), "NY".to_string()],
        ),
        HashSet::new(),
    )
}

fn short_run() -> RunSettings {
    RunSettings {
        deadline: Duration::from_millis(150),
        quiescence: Duration::from_millis(10),
    }
}

#[tokio::test]
async fn buys_eligible_loans_once_and_debits_cash() {
    let market = MockMarketplace::with_listings(vec![
        eligible_loan(101, dec!(12.5)),
        Loan { grade: "A".into(), ..eligible_loan(102, dec!(18)) },
        eligible_loan(103, dec!(15.1)),
    ]);
    let mut account = make_account("1001", "tok-a", dec!(100));

    let deadline = Deadline::start(Duration::from_millis(150));
    let investor = Investor::new(&market, deadline, Duration::from_millis(10));
    let outcome = investor.run(&mut account).await;

    assert!(matches!(outcome.reason, StopReason::DeadlineExceeded));
    assert_eq!(account.available_cash, dec!(50));
    assert_eq!(outcome.loans_purchased, vec![103, 101]);
    assert!(account.owned_loan_ids.contains(&101));
    assert!(account.owned_loan_ids.contains(&103));

    // Later cycles see the same listings but never re-buy owned notes.
    let orders = market.orders_for("tok-a");
    assert_eq!(orders.len(), 1);
    assert!(outcome.cycles > 1);
}

#[tokio::test]
async fn rejected_line_is_not_owned_or_charged() {
    let market = MockMarketplace::with_listings(vec![
        eligible_loan(201, dec!(13)),
        eligible_loan(202, dec!(11)),
    ])
    .reject_loan(201);
    let mut account = make_account("1002", "tok-b", dec!(100));

    let investor = Investor::new(&market, Deadline::start(Duration::from_secs(5)), Duration::ZERO);
    let cycle = assert_ok!(investor.run_cycle(&mut account).await);

    let report = match cycle {
        CycleOutcome::Purchased(report) => report,
        other => panic!("expected a purchase, got {other:?}"),
    };
    assert_eq!(report.purchased, vec![202]);
    assert_eq!(report.rejected, vec![201]);
    assert_eq!(account.available_cash, dec!(75));
    assert!(account.owned_loan_ids.contains(&202));
    assert!(!account.owned_loan_ids.contains(&201));
}

#[tokio::test]
async fn first_fetch_shows_all_then_only_new() {
    let market = MockMarketplace::with_listings(Vec::new());
    let mut account = make_account("1003", "tok-c", dec!(100));

    let investor = Investor::new(&market, Deadline::start(Duration::from_secs(5)), Duration::ZERO);
    for _ in 0..3 {
        assert_ok!(investor.run_cycle(&mut account).await);
    }

    assert_eq!(market.fetches_for("tok-c"), vec![true, false, false]);
    assert!(market.orders_for("tok-c").is_empty());
}

#[tokio::test]
async fn failing_account_does_not_stop_sibling() {
    let market: Arc<dyn LendingMarketplace> = Arc::new(
        MockMarketplace::with_listings(vec![eligible_loan(301, dec!(14))]).fail_fetches_for("tok-bad"),
    );
    let scheduler = Scheduler::new(market, short_run());

    let report = scheduler
        .run(vec![
            make_account("2001", "tok-bad", dec!(100)),
            make_account("2002", "tok-good", dec!(100)),
        ])
        .await;

    assert_eq!(report.outcomes.len(), 2);
    assert_eq!(report.failures(), 1);

    let bad = report.outcome("2001").unwrap();
    assert!(matches!(bad.reason, StopReason::Failed(InvestError::Transport { .. })));
    assert!(bad.loans_purchased.is_empty());

    let good = report.outcome("2002").unwrap();
    assert!(matches!(good.reason, StopReason::DeadlineExceeded));
    assert_eq!(good.loans_purchased, vec![301]);
    assert_eq!(good.cash_remaining, Some(dec!(75)));
    assert_eq!(report.loans_purchased(), 1);
}

#[tokio::test]
async fn account_without_cash_is_skipped() {
    let market = Arc::new(MockMarketplace::with_listings(vec![eligible_loan(401, dec!(14))]));
    let scheduler = Scheduler::new(market.clone(), short_run());

    let report = scheduler
        .run(vec![make_account("3001", "tok-poor", dec!(24.99))])
        .await;

    let outcome = report.outcome("3001").unwrap();
    assert!(matches!(outcome.reason, StopReason::InsufficientCash));
    assert_eq!(outcome.cycles, 0);
    assert!(market.fetches_for("tok-poor").is_empty());
}

#[tokio::test]
async fn accounts_stop_when_cash_exhausted() {
    let listings: Vec<Loan> = (1..=8).map(|i| eligible_loan(500 + i, Decimal::from(10 + i))).collect();
    let market = Arc::new(MockMarketplace::with_listings(listings));
    let scheduler = Scheduler::new(
        market.clone(),
        RunSettings {
            deadline: Duration::from_secs(5),
            quiescence: Duration::from_millis(10),
        },
    );

    let report = scheduler
        .run(vec![
            make_account("4001", "tok-x", dec!(50)),
            make_account("4002", "tok-y", dec!(75)),
        ])
        .await;

    let x = report.outcome("4001").unwrap();
    let y = report.outcome("4002").unwrap();
    assert!(matches!(x.reason, StopReason::InsufficientCash));
    assert!(matches!(y.reason, StopReason::InsufficientCash));
    assert_eq!(x.loans_purchased, vec![508, 507]);
    assert_eq!(y.loans_purchased, vec![508, 507, 506]);
    assert_eq!(x.cash_remaining, Some(Decimal::ZERO));
    assert_eq!(y.cash_remaining, Some(Decimal::ZERO));
    // Accounts are independent: both may buy the same listing.
    assert_eq!(market.orders_for("tok-x").len(), 1);
    assert_eq!(market.orders_for("tok-y").len(), 1);
    assert!(report.elapsed < Duration::from_secs(5));
}

#[tokio::test]
async fn bootstrap_then_run() {
    let market = Arc::new(
        MockMarketplace::with_listings(vec![eligible_loan(601, dec!(16))])
            .with_summary("5001", dec!(30), dec!(1000)),
    );
    std::env::set_var("AUTOINVEST_TEST_TOKEN_5001", "tok-boot");

    let config = AppConfig {
        run: Default::default(),
        marketplace: Default::default(),
        filter: FilterConfig::default(),
        accounts: vec![
            AccountConfig {
                name: "boot".into(),
                investor_id: "5001".into(),
                token_env: Some("AUTOINVEST_TEST_TOKEN_5001".into()),
                token_file: None,
                amount_per_loan: dec!(25),
                allowed_grades: vec!["C".into()],
                allowed_states: None,
                notes_csv: None,
                state_percent_limit: dec!(0.05),
            },
            AccountConfig {
                name: "unknown".into(),
                investor_id: "5999".into(),
                token_env: Some("AUTOINVEST_TEST_TOKEN_5001".into()),
                token_file: None,
                amount_per_loan: dec!(25),
                allowed_grades: vec!["C".into()],
                allowed_states: None,
                notes_csv: None,
                state_percent_limit: dec!(0.05),
            },
        ],
    };

    let accounts = setup::bootstrap_all(&config, market.as_ref()).await;
    assert_eq!(accounts.len(), 1);
    assert_eq!(accounts[0].criteria.allowed_states.len(), 50);

    let report = Scheduler::new(market.clone(), short_run()).run(accounts).await;
    let outcome = report.outcome("5001").unwrap();
    assert_eq!(outcome.loans_purchased, vec![601]);
    assert_eq!(outcome.cash_remaining, Some(dec!(5)));
    assert!(matches!(outcome.reason, StopReason::InsufficientCash));
}
