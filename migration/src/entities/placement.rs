//! Placement entity: a named slot where advertisements can be displayed

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "placements")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    #[sea_orm(unique)]
    pub name: String,
    /// Location tag (homepage_banner, search_results, sidebar, ...)
    pub location: String,
    /// Creative dimensions, e.g. "728x90"
    pub dimensions: Option<String>,
    pub max_creative_size_kb: i32,
    /// Cost of a single impression, in currency micros
    pub price_per_impression: i64,
    /// Cost of a single click, in currency micros
    pub price_per_click: i64,
    pub is_active: bool,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
