//! Source checking and resolution
//!
//! `check` decides which info-hashes are instantly available per vendor,
//! `resolve` turns a chosen source into a playable URL, and `utils` holds
//! the filename filters shared by both.

pub mod check;
pub mod resolve;
pub mod utils;

pub use check::{CacheCheckSession, BULK_BATCH_CAP};
pub use resolve::{ResolveFailure, Resolver};
