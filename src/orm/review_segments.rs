//! SeaORM Entity for the review_segments table
//!
//! One rated sub-aspect of a review. Segments are created in lockstep with
//! their parent review, one per category segment in `position` order, and
//! only ever deleted by cascade from the review.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "review_segments")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub review_id: i32,
    pub segment_id: i32,
    pub rating: i32,
    #[sea_orm(column_type = "Text")]
    pub text: String,
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
    #[sea_orm(
        belongs_to = "super::category_segments::Entity",
        from = "Column::SegmentId",
        to = "super::category_segments::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    CategorySegment,
}

impl Related<super::reviews::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Review.def()
    }
}

impl Related<super::category_segments::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CategorySegment.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
