//! SeaORM Entity for the category_segments table
//!
//! One rated sub-aspect of a category (e.g. "cleanliness"). `position` is
//! unique within a category and defines the render/iteration order; the
//! segment sub-form set is built from it, so it must not change between
//! rendering and submission of the same form.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "category_segments")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub title: String,
    pub position: i32,
    pub category_id: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::categories::Entity",
        from = "Column::CategoryId",
        to = "super::categories::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Category,
    #[sea_orm(has_many = "super::review_segments::Entity")]
    ReviewSegments,
}

impl Related<super::categories::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Category.def()
    }
}

impl Related<super::review_segments::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ReviewSegments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
