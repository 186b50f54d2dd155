use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "posts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub title: String,
    #[sea_orm(unique)]
    pub slug: String,
    pub content: String,
    pub excerpt: String,
    pub author_id: Option<Uuid>,
    pub category_id: Option<Uuid>,
    /// `draft` or `published`.
    pub status: String,
    pub views: i32,
    pub published_at: Option<DateTimeWithTimeZone>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::blog_categories::Entity",
        from = "Column::CategoryId",
        to = "super::blog_categories::Column::Id"
    )]
    BlogCategories,
    #[sea_orm(has_many = "super::post_comments::Entity")]
    PostComments,
}

impl Related<super::blog_categories::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BlogCategories.def()
    }
}

impl Related<super::post_comments::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PostComments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
