use sea_orm::sea_query::OnConflict;
use sea_orm::{DatabaseConnection, DbErr, EntityTrait, PaginatorTrait, Set};

use crate::models::category;

const DEFAULT_CATEGORIES: [&str; 5] =
    ["Fiction", "Non-Fiction", "Science", "History", "Biography"];

/// Insert the default categories when the table is empty. Safe to call on
/// every startup.
pub async fn seed_default_categories(db: &DatabaseConnection) -> Result<(), DbErr> {
    let existing = category::Entity::find().count(db).await?;
    if existing > 0 {
        return Ok(());
    }

    for name in DEFAULT_CATEGORIES {
        let row = category::ActiveModel {
            name: Set(name.to_owned()),
            ..Default::default()
        };
        // A concurrent starter may have won the race for a name; ignore it.
        match category::Entity::insert(row)
            .on_conflict(
                OnConflict::column(category::Column::Name)
                    .do_nothing()
                    .to_owned(),
            )
            .exec(db)
            .await
        {
            Ok(_) | Err(DbErr::RecordNotInserted) => {}
            Err(e) => return Err(e),
        }
    }

    tracing::info!("seeded {} default categories", DEFAULT_CATEGORIES.len());
    Ok(())
}
