//! Domain layer - error taxonomy and data-access contracts
//!
//! Nothing here depends on a concrete storage backend beyond the error
//! conversion from the driver; implementations live in `infrastructure`.

pub mod errors;
pub mod refs;

pub use errors::DomainError;
pub use refs::{BookReferenceIndex, ContributorSummary};
