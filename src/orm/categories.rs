//! SeaORM Entity for the categories table
//!
//! A category is a named axis of review ("service", "food", ...). Categories
//! are administrator-managed reference data; each owns an ordered set of
//! rating segments.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "categories")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub code: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::category_segments::Entity")]
    CategorySegments,
    #[sea_orm(has_many = "super::reviews::Entity")]
    Reviews,
}

impl Related<super::category_segments::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CategorySegments.def()
    }
}

impl Related<super::reviews::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Reviews.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
