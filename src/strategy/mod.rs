//! Investment strategy — listing eligibility and ranking.

pub mod filter;

pub use filter::select;
