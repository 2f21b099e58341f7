//! SeaORM implementation of BookReferenceIndex
//!
//! Reproduces the schema's denormalization: author/publisher references are
//! resolved by comparing row names against the free-text columns on books.

use async_trait::async_trait;
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, FromQueryResult,
    PaginatorTrait, QueryFilter, Statement,
};

use crate::domain::{BookReferenceIndex, ContributorSummary, DomainError};
use crate::models::book;

#[derive(Debug, FromQueryResult)]
struct SummaryRow {
    id: i32,
    name: String,
    book_count: i64,
}

pub struct NameColumnRefs {
    db: DatabaseConnection,
}

impl NameColumnRefs {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    async fn summaries(&self, sql: &str) -> Result<Vec<ContributorSummary>, DomainError> {
        let rows = SummaryRow::find_by_statement(Statement::from_string(
            self.db.get_database_backend(),
            sql.to_owned(),
        ))
        .all(&self.db)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| ContributorSummary {
                id: r.id,
                name: r.name,
                book_count: r.book_count,
            })
            .collect())
    }
}

#[async_trait]
impl BookReferenceIndex for NameColumnRefs {
    async fn count_books_by_author_name(&self, name: &str) -> Result<u64, DomainError> {
        let count = book::Entity::find()
            .filter(book::Column::AuthorName.eq(name))
            .count(&self.db)
            .await?;
        Ok(count)
    }

    async fn count_books_by_publisher_name(&self, name: &str) -> Result<u64, DomainError> {
        let count = book::Entity::find()
            .filter(book::Column::PublisherName.eq(name))
            .count(&self.db)
            .await?;
        Ok(count)
    }

    async fn author_summaries(&self) -> Result<Vec<ContributorSummary>, DomainError> {
        self.summaries(
            r#"
            SELECT a.id, a.name, COUNT(b.id) AS book_count
            FROM authors a
            LEFT JOIN books b ON a.name = b.author_name
            GROUP BY a.id, a.name
            ORDER BY a.name
            "#,
        )
        .await
    }

    async fn publisher_summaries(&self) -> Result<Vec<ContributorSummary>, DomainError> {
        self.summaries(
            r#"
            SELECT p.id, p.name, COUNT(b.id) AS book_count
            FROM publishers p
            LEFT JOIN books b ON p.name = b.publisher_name
            GROUP BY p.id, p.name
            ORDER BY p.name
            "#,
        )
        .await
    }
}
