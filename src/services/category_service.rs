//! Category service - CRUD plus the pre-delete guard count.

use sea_orm::sea_query::Expr;
use sea_orm::{
    ColumnTrait, ConnectionTrait, EntityTrait, FromQueryResult, PaginatorTrait, QueryFilter,
    Set, Statement,
};
use serde::Serialize;

use crate::Library;
use crate::domain::DomainError;
use crate::models::{book, category};

/// Category row enriched with the number of books referencing it.
#[derive(Debug, Clone, PartialEq, FromQueryResult, Serialize)]
pub struct CategorySummary {
    pub id: i32,
    pub name: String,
    pub book_count: i64,
}

pub async fn get_all_categories(app: &Library) -> Result<Vec<CategorySummary>, DomainError> {
    let db = app.conn();
    let rows = CategorySummary::find_by_statement(Statement::from_string(
        db.get_database_backend(),
        r#"
        SELECT c.id, c.name, COUNT(b.id) AS book_count
        FROM categories c
        LEFT JOIN books b ON c.id = b.category_id
        GROUP BY c.id, c.name
        ORDER BY c.name
        "#
        .to_owned(),
    ))
    .all(db)
    .await?;
    Ok(rows)
}

pub async fn get_category_by_id(
    app: &Library,
    id: i32,
) -> Result<Option<category::Model>, DomainError> {
    let row = category::Entity::find_by_id(id).one(app.conn()).await?;
    Ok(row)
}

pub async fn add_category(app: &Library, name: &str) -> Result<i32, DomainError> {
    let db = app.conn();
    app.retry()
        .run(|| async move {
            let row = category::ActiveModel {
                name: Set(name.to_owned()),
                ..Default::default()
            };
            let res = category::Entity::insert(row).exec(db).await?;
            Ok(res.last_insert_id)
        })
        .await
}

pub async fn update_category(app: &Library, id: i32, name: &str) -> Result<(), DomainError> {
    let db = app.conn();
    app.retry()
        .run(|| async move {
            let res = category::Entity::update_many()
                .col_expr(category::Column::Name, Expr::value(name))
                .filter(category::Column::Id.eq(id))
                .exec(db)
                .await?;
            if res.rows_affected == 0 {
                return Err(DomainError::NotFound);
            }
            Ok(())
        })
        .await
}

/// Deletes unconditionally; callers check [`get_book_count_for_category`]
/// first. A bypassed guard is still caught by the books foreign key.
pub async fn delete_category(app: &Library, id: i32) -> Result<(), DomainError> {
    let db = app.conn();
    app.retry()
        .run(|| async move {
            let res = category::Entity::delete_by_id(id).exec(db).await?;
            if res.rows_affected == 0 {
                return Err(DomainError::NotFound);
            }
            Ok(())
        })
        .await
}

/// Guard: a count above zero means the category must not be deleted.
pub async fn get_book_count_for_category(app: &Library, id: i32) -> Result<u64, DomainError> {
    let count = book::Entity::find()
        .filter(book::Column::CategoryId.eq(id))
        .count(app.conn())
        .await?;
    Ok(count)
}
