//! Library-management data-access core.
//!
//! Tracks books, categories, authors, publishers, borrowers and loans in a
//! single SQLite file, and owns the invariants that span tables: loan
//! lifecycle, availability accounting, integrity-guard counts, retry on
//! transient lock contention, and a short-lived read cache. The web layer
//! sits on top of [`services`] and is not part of this crate.

pub mod cache;
pub mod config;
pub mod db;
pub mod domain;
pub mod infrastructure;
pub mod models;
pub mod retry;
pub mod seed;
pub mod services;

pub use cache::ReadCache;
pub use config::Config;
pub use domain::DomainError;
pub use infrastructure::state::Library;
pub use retry::RetryPolicy;
