//! Author service - CRUD plus the name-scan guard.
//!
//! Books reference authors by name string, so the list and guard reads go
//! through the BookReferenceIndex seam instead of a foreign key.

use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, Set};

use crate::Library;
use crate::domain::{ContributorSummary, DomainError};
use crate::models::author;

pub async fn get_all_authors(app: &Library) -> Result<Vec<ContributorSummary>, DomainError> {
    app.refs().author_summaries().await
}

pub async fn get_author_by_id(
    app: &Library,
    id: i32,
) -> Result<Option<author::Model>, DomainError> {
    let row = author::Entity::find_by_id(id).one(app.conn()).await?;
    Ok(row)
}

pub async fn add_author(app: &Library, name: &str) -> Result<i32, DomainError> {
    let db = app.conn();
    app.retry()
        .run(|| async move {
            let row = author::ActiveModel {
                name: Set(name.to_owned()),
                ..Default::default()
            };
            let res = author::Entity::insert(row).exec(db).await?;
            Ok(res.last_insert_id)
        })
        .await
}

pub async fn update_author(app: &Library, id: i32, name: &str) -> Result<(), DomainError> {
    let db = app.conn();
    app.retry()
        .run(|| async move {
            let res = author::Entity::update_many()
                .col_expr(author::Column::Name, Expr::value(name))
                .filter(author::Column::Id.eq(id))
                .exec(db)
                .await?;
            if res.rows_affected == 0 {
                return Err(DomainError::NotFound);
            }
            Ok(())
        })
        .await
}

/// No foreign key backs the name references, so nothing at the store level
/// stops this delete; callers must honor [`get_book_count_for_author`].
pub async fn delete_author(app: &Library, id: i32) -> Result<(), DomainError> {
    let db = app.conn();
    app.retry()
        .run(|| async move {
            let res = author::Entity::delete_by_id(id).exec(db).await?;
            if res.rows_affected == 0 {
                return Err(DomainError::NotFound);
            }
            Ok(())
        })
        .await
}

/// Guard: number of books whose free-text author field matches this
/// author's name.
pub async fn get_book_count_for_author(app: &Library, id: i32) -> Result<u64, DomainError> {
    let author = author::Entity::find_by_id(id)
        .one(app.conn())
        .await?
        .ok_or(DomainError::NotFound)?;
    app.refs().count_books_by_author_name(&author.name).await
}
