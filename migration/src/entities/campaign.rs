//! Campaign entity: groups advertisements under shared goals
//!
//! Campaigns never store performance counters; campaign figures are
//! always recomputed from member advertisements.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "campaigns")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub name: String,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    pub campaign_type: String,
    pub manager_id: String,
    /// Total campaign budget (micros)
    pub total_budget: i64,
    pub schedule_start: DateTimeUtc,
    pub schedule_end: DateTimeUtc,
    pub target_impressions: Option<i64>,
    pub target_clicks: Option<i64>,
    pub target_conversions: Option<i64>,
    /// Target CTR, percent
    pub target_ctr: Option<f64>,
    pub is_active: bool,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
