//! Publisher service - same shape as the author service, matching against
//! the books.publisher_name column.

use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, Set};

use crate::Library;
use crate::domain::{ContributorSummary, DomainError};
use crate::models::publisher;

pub async fn get_all_publishers(app: &Library) -> Result<Vec<ContributorSummary>, DomainError> {
    app.refs().publisher_summaries().await
}

pub async fn get_publisher_by_id(
    app: &Library,
    id: i32,
) -> Result<Option<publisher::Model>, DomainError> {
    let row = publisher::Entity::find_by_id(id).one(app.conn()).await?;
    Ok(row)
}

pub async fn add_publisher(app: &Library, name: &str) -> Result<i32, DomainError> {
    let db = app.conn();
    app.retry()
        .run(|| async move {
            let row = publisher::ActiveModel {
                name: Set(name.to_owned()),
                ..Default::default()
            };
            let res = publisher::Entity::insert(row).exec(db).await?;
            Ok(res.last_insert_id)
        })
        .await
}

pub async fn update_publisher(app: &Library, id: i32, name: &str) -> Result<(), DomainError> {
    let db = app.conn();
    app.retry()
        .run(|| async move {
            let res = publisher::Entity::update_many()
                .col_expr(publisher::Column::Name, Expr::value(name))
                .filter(publisher::Column::Id.eq(id))
                .exec(db)
                .await?;
            if res.rows_affected == 0 {
                return Err(DomainError::NotFound);
            }
            Ok(())
        })
        .await
}

/// No store-level backstop here either; callers must honor
/// [`get_book_count_for_publisher`].
pub async fn delete_publisher(app: &Library, id: i32) -> Result<(), DomainError> {
    let db = app.conn();
    app.retry()
        .run(|| async move {
            let res = publisher::Entity::delete_by_id(id).exec(db).await?;
            if res.rows_affected == 0 {
                return Err(DomainError::NotFound);
            }
            Ok(())
        })
        .await
}

/// Guard: number of books whose free-text publisher field matches this
/// publisher's name.
pub async fn get_book_count_for_publisher(app: &Library, id: i32) -> Result<u64, DomainError> {
    let publisher = publisher::Entity::find_by_id(id)
        .one(app.conn())
        .await?
        .ok_or(DomainError::NotFound)?;
    app.refs()
        .count_books_by_publisher_name(&publisher.name)
        .await
}
