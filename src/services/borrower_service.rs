//! Borrower service - CRUD and the loan-count summary listing.

use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ColumnTrait, ConnectionTrait, EntityTrait, FromQueryResult, PaginatorTrait, QueryFilter,
    Set, Statement,
};
use serde::{Deserialize, Serialize};

use crate::Library;
use crate::domain::DomainError;
use crate::models::borrower;

/// Cache key prefix for borrower listings; loan transitions invalidate it
/// too, since they change the per-borrower counts.
pub(crate) const CACHE_PREFIX: &str = "borrowers";

/// Borrower row enriched with loan counts for the listing view.
#[derive(Debug, Clone, PartialEq, FromQueryResult, Serialize, Deserialize)]
pub struct BorrowerSummary {
    pub id: i32,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub joined_date: String,
    pub active_loans: i64,
    pub total_loans: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BorrowerInput {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
}

pub async fn get_all_borrowers(app: &Library) -> Result<Vec<BorrowerSummary>, DomainError> {
    let key = format!("{CACHE_PREFIX}:all");
    if let Some(hit) = app.cache().get::<Vec<BorrowerSummary>>(&key) {
        return Ok(hit);
    }

    let db = app.conn();
    let rows = BorrowerSummary::find_by_statement(Statement::from_string(
        db.get_database_backend(),
        r#"
        SELECT b.id, b.name, b.email, b.phone, b.joined_date,
               COUNT(CASE WHEN l.status = 'active' THEN 1 END) AS active_loans,
               COUNT(l.id) AS total_loans
        FROM borrowers b
        LEFT JOIN loans l ON b.id = l.borrower_id
        GROUP BY b.id, b.name, b.email, b.phone, b.joined_date
        ORDER BY b.name
        "#
        .to_owned(),
    ))
    .all(db)
    .await?;

    app.cache().put(&key, &rows);
    Ok(rows)
}

pub async fn get_borrower_by_id(
    app: &Library,
    id: i32,
) -> Result<Option<borrower::Model>, DomainError> {
    let row = borrower::Entity::find_by_id(id).one(app.conn()).await?;
    Ok(row)
}

pub async fn add_borrower(app: &Library, input: BorrowerInput) -> Result<i32, DomainError> {
    let db = app.conn();
    let input = &input;
    let id = app
        .retry()
        .run(|| async move {
            let row = borrower::ActiveModel {
                name: Set(input.name.clone()),
                email: Set(input.email.clone()),
                phone: Set(input.phone.clone()),
                joined_date: Set(Utc::now().to_rfc3339()),
                ..Default::default()
            };
            let res = borrower::Entity::insert(row).exec(db).await?;
            Ok(res.last_insert_id)
        })
        .await?;

    app.cache().invalidate(CACHE_PREFIX);
    Ok(id)
}

pub async fn update_borrower(
    app: &Library,
    id: i32,
    input: BorrowerInput,
) -> Result<(), DomainError> {
    let db = app.conn();
    let input = &input;
    app.retry()
        .run(|| async move {
            let res = borrower::Entity::update_many()
                .col_expr(borrower::Column::Name, Expr::value(input.name.clone()))
                .col_expr(borrower::Column::Email, Expr::value(input.email.clone()))
                .col_expr(borrower::Column::Phone, Expr::value(input.phone.clone()))
                .filter(borrower::Column::Id.eq(id))
                .exec(db)
                .await?;
            if res.rows_affected == 0 {
                return Err(DomainError::NotFound);
            }
            Ok(())
        })
        .await?;

    app.cache().invalidate(CACHE_PREFIX);
    Ok(())
}

/// Deletes unconditionally; callers check the loan-count guards first. The
/// loans foreign key rejects a bypassed delete while any loan references
/// the borrower.
pub async fn delete_borrower(app: &Library, id: i32) -> Result<(), DomainError> {
    let db = app.conn();
    app.retry()
        .run(|| async move {
            let res = borrower::Entity::delete_by_id(id).exec(db).await?;
            if res.rows_affected == 0 {
                return Err(DomainError::NotFound);
            }
            Ok(())
        })
        .await?;

    app.cache().invalidate(CACHE_PREFIX);
    Ok(())
}

pub async fn get_total_borrowers(app: &Library) -> Result<u64, DomainError> {
    let count = borrower::Entity::find().count(app.conn()).await?;
    Ok(count)
}
