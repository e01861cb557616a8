//! Advertisement-to-placement assignment (unique per pair)

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "placement_assignments")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub advertisement_id: String,
    pub placement_id: i64,
    /// Serving priority, 1 = highest
    pub priority: i32,
    /// Optional impression cap for this placement
    pub max_impressions: Option<i64>,
    pub assigned_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
