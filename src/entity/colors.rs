use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "colors")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    pub hex_code: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::product_colors::Entity")]
    ProductColors,
}

impl Related<super::product_colors::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ProductColors.def()
    }
}

impl Related<super::products::Entity> for Entity {
    fn to() -> RelationDef {
        super::product_colors::Relation::Products.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::product_colors::Relation::Colors.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
