//! SeaORM Entity for the reviews table
//!
//! One user's review of one content object. The target is carried as a
//! `(content_type, object_pk)` pair so any host model can be reviewed without
//! a hard foreign key. If `user_id` is set the review was posted by an
//! authenticated user; otherwise `user_name`/`user_email` identify the
//! author. Moderation flips `is_public`/`is_removed` after the fact.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "reviews")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub content_type: String,
    #[sea_orm(column_type = "Text")]
    pub object_pk: String,
    pub site_id: i32,
    pub user_id: Option<i32>,
    pub user_name: String,
    pub user_email: String,
    #[sea_orm(column_type = "Text")]
    pub text: String,
    pub submit_date: chrono::NaiveDateTime,
    pub ip_address: Option<String>,
    pub is_public: bool,
    pub is_removed: bool,
    pub category_id: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::categories::Entity",
        from = "Column::CategoryId",
        to = "super::categories::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Category,
    #[sea_orm(has_many = "super::review_segments::Entity")]
    ReviewSegments,
    #[sea_orm(has_many = "super::review_flags::Entity")]
    ReviewFlags,
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

impl Related<super::review_flags::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ReviewFlags.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Location of the reviewed object itself, used as the redirect of last
    /// resort after posting.
    pub fn content_object_url(&self) -> String {
        format!("/cr/{}/{}/", self.content_type, self.object_pk)
    }

    /// Anchor link to this review on the content object's page.
    pub fn absolute_url(&self) -> String {
        format!("{}#c{}", self.content_object_url(), self.id)
    }
}
