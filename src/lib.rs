//! autoinvest — automated note purchasing for peer-lending marketplaces.
//!
//! Library crate exposing all modules for use by integration tests
//! and the binary entry point.

pub mod account;
pub mod config;
pub mod engine;
pub mod marketplace;
pub mod setup;
pub mod strategy;
pub mod types;
