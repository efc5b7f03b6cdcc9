use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "tag")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub name: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::review_tag::Entity")]
    ReviewTag,
}

impl Related<super::review::Entity> for Entity {
    fn to() -> RelationDef {
        super::review_tag::Relation::Review.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::review_tag::Relation::Tag.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
