//! Services Layer
//!
//! The domain operations the excluded web layer calls: entity CRUD, the
//! loan state machine with availability accounting, integrity-guard counts,
//! and the dashboard aggregates. Mutating operations run through the retry
//! policy; list reads may hit the read cache.

pub mod author_service;
pub mod book_service;
pub mod borrower_service;
pub mod category_service;
pub mod loan_service;
pub mod publisher_service;

pub use author_service::*;
pub use book_service::*;
pub use borrower_service::*;
pub use category_service::*;
pub use loan_service::*;
pub use publisher_service::*;
