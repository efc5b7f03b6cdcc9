use sea_orm::entity::prelude::*;

use crate::models::{CatalogSource, MediaType};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "title")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub tmdb_id: i32,
    pub media_type: MediaType,
    pub source: CatalogSource,
    pub title: String,
    pub original_title: Option<String>,
    pub overview: Option<String>,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    pub runtime_minutes: Option<i32>,
    /// JSON array of genre names.
    pub genres: String,
    pub release_date: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::review::Entity")]
    Review,
    #[sea_orm(has_many = "super::diary_entry::Entity")]
    DiaryEntry,
    #[sea_orm(has_many = "super::list_item::Entity")]
    ListItem,
}

impl Related<super::review::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Review.def()
    }
}

impl Related<super::diary_entry::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::DiaryEntry.def()
    }
}

impl Related<super::list_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ListItem.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn genre_names(&self) -> Vec<String> {
        serde_json::from_str(&self.genres).unwrap_or_default()
    }
}
