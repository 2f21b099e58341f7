//! Book service - catalogue CRUD and availability bookkeeping.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, FromQueryResult,
    PaginatorTrait, QueryFilter, QueryOrder, Set, Statement, TransactionTrait,
};
use serde::{Deserialize, Serialize};

use crate::Library;
use crate::domain::DomainError;
use crate::models::{book, category, loan};
use crate::services::loan_service::STATUS_ACTIVE;

/// Cache key prefix for book listings; loan transitions invalidate it too.
pub(crate) const CACHE_PREFIX: &str = "books";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookDto {
    pub id: i32,
    pub title: String,
    pub isbn: Option<String>,
    pub category_id: Option<i32>,
    pub category_name: Option<String>,
    pub author_name: Option<String>,
    pub publisher_name: Option<String>,
    pub quantity: i32,
    pub available: i32,
    pub added_date: String,
}

impl From<(book::Model, Option<category::Model>)> for BookDto {
    fn from((book, category): (book::Model, Option<category::Model>)) -> Self {
        Self {
            id: book.id,
            title: book.title,
            isbn: book.isbn,
            category_id: book.category_id,
            category_name: category.map(|c| c.name),
            author_name: book.author_name,
            publisher_name: book.publisher_name,
            quantity: book.quantity,
            available: book.available,
            added_date: book.added_date,
        }
    }
}

/// Fields the caller provides; `available` is always derived.
#[derive(Debug, Clone, Deserialize)]
pub struct BookInput {
    pub title: String,
    pub isbn: Option<String>,
    pub category_id: Option<i32>,
    pub author_name: Option<String>,
    pub publisher_name: Option<String>,
    pub quantity: i32,
}

/// List books with optional title search and category filter, ordered by
/// title. Results are cached per filter combination.
pub async fn get_all_books(
    app: &Library,
    search: Option<&str>,
    category_filter: Option<i32>,
) -> Result<Vec<BookDto>, DomainError> {
    let key = format!(
        "{CACHE_PREFIX}:{}:{}",
        search.unwrap_or(""),
        category_filter.map(|id| id.to_string()).unwrap_or_default()
    );
    if let Some(hit) = app.cache().get::<Vec<BookDto>>(&key) {
        return Ok(hit);
    }

    let mut query = book::Entity::find().find_also_related(category::Entity);
    if let Some(search) = search.filter(|s| !s.is_empty()) {
        query = query.filter(book::Column::Title.contains(search));
    }
    if let Some(category_id) = category_filter {
        query = query.filter(book::Column::CategoryId.eq(category_id));
    }

    let rows = query
        .order_by_asc(book::Column::Title)
        .all(app.conn())
        .await?;
    let result: Vec<BookDto> = rows.into_iter().map(BookDto::from).collect();

    app.cache().put(&key, &result);
    Ok(result)
}

pub async fn get_book_by_id(app: &Library, id: i32) -> Result<Option<BookDto>, DomainError> {
    let row = book::Entity::find_by_id(id)
        .find_also_related(category::Entity)
        .one(app.conn())
        .await?;
    Ok(row.map(BookDto::from))
}

pub async fn add_book(app: &Library, input: BookInput) -> Result<i32, DomainError> {
    if input.quantity < 0 {
        return Err(DomainError::Invalid(format!(
            "quantity cannot be negative: {}",
            input.quantity
        )));
    }

    let db = app.conn();
    let input = &input;
    let id = app
        .retry()
        .run(|| async move {
            let row = book::ActiveModel {
                title: Set(input.title.clone()),
                isbn: Set(input.isbn.clone()),
                category_id: Set(input.category_id),
                author_name: Set(input.author_name.clone()),
                publisher_name: Set(input.publisher_name.clone()),
                quantity: Set(input.quantity),
                available: Set(input.quantity),
                added_date: Set(Utc::now().to_rfc3339()),
                ..Default::default()
            };
            let res = book::Entity::insert(row).exec(db).await?;
            Ok(res.last_insert_id)
        })
        .await?;

    app.cache().invalidate(CACHE_PREFIX);
    Ok(id)
}

/// Update a book and recompute `available` from the new quantity and the
/// active-loan count, all in one transaction. Returns the active-loan
/// count: when it exceeds the new quantity the row persists anyway and the
/// caller is responsible for surfacing the conflict.
pub async fn update_book(
    app: &Library,
    id: i32,
    input: BookInput,
) -> Result<u64, DomainError> {
    if input.quantity < 0 {
        return Err(DomainError::Invalid(format!(
            "quantity cannot be negative: {}",
            input.quantity
        )));
    }

    let db = app.conn();
    let input = &input;
    let active_loans = app
        .retry()
        .run(|| async move {
            let txn = db.begin().await?;

            let existing = book::Entity::find_by_id(id)
                .one(&txn)
                .await?
                .ok_or(DomainError::NotFound)?;

            let active_loans = loan::Entity::find()
                .filter(loan::Column::BookId.eq(id))
                .filter(loan::Column::Status.eq(STATUS_ACTIVE))
                .count(&txn)
                .await?;

            let mut row: book::ActiveModel = existing.into();
            row.title = Set(input.title.clone());
            row.isbn = Set(input.isbn.clone());
            row.category_id = Set(input.category_id);
            row.author_name = Set(input.author_name.clone());
            row.publisher_name = Set(input.publisher_name.clone());
            row.quantity = Set(input.quantity);
            row.available = Set(input.quantity - active_loans as i32);
            row.update(&txn).await?;

            txn.commit().await?;
            Ok(active_loans)
        })
        .await?;

    app.cache().invalidate(CACHE_PREFIX);
    Ok(active_loans)
}

/// Deletes unconditionally; callers check the loan-count guard first. The
/// loans foreign key rejects a bypassed delete while loans reference the
/// book.
pub async fn delete_book(app: &Library, id: i32) -> Result<(), DomainError> {
    let db = app.conn();
    app.retry()
        .run(|| async move {
            let res = book::Entity::delete_by_id(id).exec(db).await?;
            if res.rows_affected == 0 {
                return Err(DomainError::NotFound);
            }
            Ok(())
        })
        .await?;

    app.cache().invalidate(CACHE_PREFIX);
    Ok(())
}

pub async fn get_total_books(app: &Library) -> Result<u64, DomainError> {
    let count = book::Entity::find().count(app.conn()).await?;
    Ok(count)
}

#[derive(FromQueryResult)]
struct AvailableTotal {
    total: i64,
}

/// Sum of available copies across the whole catalogue.
pub async fn get_total_available_books(app: &Library) -> Result<i64, DomainError> {
    let db = app.conn();
    let row = AvailableTotal::find_by_statement(Statement::from_string(
        db.get_database_backend(),
        "SELECT COALESCE(SUM(available), 0) AS total FROM books".to_owned(),
    ))
    .one(db)
    .await?;
    Ok(row.map(|r| r.total).unwrap_or(0))
}
