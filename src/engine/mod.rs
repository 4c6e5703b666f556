//! Core engine — the per-account poll → filter → order → reconcile loop
//! and the scheduler that runs one loop per account.

pub mod accountant;
pub mod investor;
pub mod order;
pub mod scheduler;
