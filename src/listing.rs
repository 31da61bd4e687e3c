//! Read-side listing helpers
//!
//! Everything a page needs to show reviews for one content object: the
//! filtered list and the count. Both apply the same visibility policy, so a
//! rendered list and its advertised count cannot disagree: public reviews
//! of the configured site only, with removed reviews hidden unless the
//! policy says to keep them (as tombstones).

use crate::app_config;
use crate::db::get_db_pool;
use crate::orm::reviews;
use sea_orm::{entity::*, query::*, ColumnTrait, DbErr, QueryFilter};

/// Optional narrowing of a listing query.
#[derive(Debug, Clone, Default)]
pub struct ListingOptions {
    /// Only reviews in this category
    pub category_id: Option<i32>,
    pub offset: Option<u64>,
    pub limit: Option<u64>,
}

fn visible_reviews(content_type: &str, object_pk: &str) -> Select<reviews::Entity> {
    let policy = app_config::reviews();
    let mut query = reviews::Entity::find()
        .filter(reviews::Column::ContentType.eq(content_type))
        .filter(reviews::Column::ObjectPk.eq(object_pk))
        .filter(reviews::Column::SiteId.eq(app_config::site().id))
        .filter(reviews::Column::IsPublic.eq(true));
    if policy.hide_removed {
        query = query.filter(reviews::Column::IsRemoved.eq(false));
    }
    query
}

/// Visible reviews of one content object, newest first.
///
/// A target with no primary key has never been persisted and can have no
/// reviews; the database is not consulted for it.
pub async fn reviews_for(
    content_type: &str,
    object_pk: Option<&str>,
    opts: &ListingOptions,
) -> Result<Vec<reviews::Model>, DbErr> {
    let pk = match object_pk {
        Some(pk) if !pk.is_empty() => pk,
        _ => return Ok(Vec::new()),
    };

    let mut query =
        visible_reviews(content_type, pk).order_by_desc(reviews::Column::Id);
    if let Some(category_id) = opts.category_id {
        query = query.filter(reviews::Column::CategoryId.eq(category_id));
    }
    if let Some(offset) = opts.offset {
        query = query.offset(offset);
    }
    if let Some(limit) = opts.limit {
        query = query.limit(limit);
    }
    query.all(get_db_pool()).await
}

/// Number of visible reviews of one content object.
pub async fn review_count(content_type: &str, object_pk: Option<&str>) -> Result<usize, DbErr> {
    let pk = match object_pk {
        Some(pk) if !pk.is_empty() => pk,
        _ => return Ok(0),
    };
    visible_reviews(content_type, pk).count(get_db_pool()).await
}
