//! The decrypt-compare-install decision engine
//!
//! This module provides:
//! - **request**: what to sync and how
//! - **result**: the immutable outcome of one run
//! - **engine**: resolve, probe, decrypt, decide, then install or reconcile

mod engine;
mod request;
mod result;

pub use engine::{Decision, SyncEngine};
pub use request::{SyncOptions, SyncRequest};
pub use result::{ChecksumDiff, SyncResult};
