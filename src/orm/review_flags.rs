//! SeaORM Entity for the review_flags table
//!
//! Records a flag raised on a review: a user's removal suggestion, a
//! moderator deletion or approval, or a host-defined custom flag. A user may
//! raise a given flag on a given review at most once; the database enforces
//! this with a unique index over (user_id, review_id, flag). Flags are
//! immutable once created.

use sea_orm::entity::prelude::*;

/// Flag raised when a user suggests a review for removal.
pub const SUGGEST_REMOVAL: &str = "removal suggestion";
/// Flag raised when a moderator deletes a review.
pub const MODERATOR_DELETION: &str = "moderator deletion";
/// Flag raised when a moderator approves a review.
pub const MODERATOR_APPROVAL: &str = "moderator approval";

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "review_flags")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub user_id: i32,
    pub review_id: i32,
    #[sea_orm(indexed)]
    pub flag: String,
    pub flag_date: chrono::NaiveDateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::reviews::Entity",
        from = "Column::ReviewId",
        to = "super::reviews::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Review,
}

impl Related<super::reviews::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Review.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
