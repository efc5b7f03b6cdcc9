use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "review")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub title_id: String,
    pub user_id: Option<String>,
    pub watched_on: Option<String>,
    pub rating: Option<f64>,
    pub contains_spoilers: bool,
    pub liked: bool,
    pub body: String,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::title::Entity",
        from = "Column::TitleId",
        to = "super::title::Column::Id",
        on_delete = "Cascade"
    )]
    Title,
    #[sea_orm(has_many = "super::review_tag::Entity")]
    ReviewTag,
}

impl Related<super::title::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Title.def()
    }
}

impl Related<super::tag::Entity> for Entity {
    fn to() -> RelationDef {
        super::review_tag::Relation::Tag.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::review_tag::Relation::Review.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
