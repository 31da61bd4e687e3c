//! Read-only accessors for the category/segment reference data

use crate::orm::{categories, category_segments};
use sea_orm::{entity::*, query::*, ColumnTrait, DatabaseConnection, DbErr, QueryFilter};

/// Resolve a category by its unique code.
pub async fn category_by_code(
    db: &DatabaseConnection,
    code: &str,
) -> Result<Option<categories::Model>, DbErr> {
    categories::Entity::find()
        .filter(categories::Column::Code.eq(code))
        .one(db)
        .await
}

/// The segments of a category, ordered by position ascending.
///
/// The order is the segment sub-form order; it must be identical between
/// rendering a form and validating its submission.
pub async fn segments_for(
    db: &DatabaseConnection,
    category_id: i32,
) -> Result<Vec<category_segments::Model>, DbErr> {
    category_segments::Entity::find()
        .filter(category_segments::Column::CategoryId.eq(category_id))
        .order_by_asc(category_segments::Column::Position)
        .all(db)
        .await
}
