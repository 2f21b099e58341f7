//! Name-based book reference contracts
//!
//! Books carry `author_name` / `publisher_name` as free text rather than
//! foreign keys. Every place that matches those strings against author or
//! publisher rows goes through this trait, so a later move to real foreign
//! keys only touches the implementation.

use async_trait::async_trait;

use super::DomainError;

/// Author or publisher row enriched with the number of books naming it.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct ContributorSummary {
    pub id: i32,
    pub name: String,
    pub book_count: i64,
}

#[async_trait]
pub trait BookReferenceIndex: Send + Sync {
    /// Number of books whose free-text author field equals `name`.
    async fn count_books_by_author_name(&self, name: &str) -> Result<u64, DomainError>;

    /// Number of books whose free-text publisher field equals `name`.
    async fn count_books_by_publisher_name(&self, name: &str) -> Result<u64, DomainError>;

    /// All authors with their book counts, ordered by name.
    async fn author_summaries(&self) -> Result<Vec<ContributorSummary>, DomainError>;

    /// All publishers with their book counts, ordered by name.
    async fn publisher_summaries(&self) -> Result<Vec<ContributorSummary>, DomainError>;
}
