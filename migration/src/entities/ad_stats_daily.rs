//! 天级广告统计汇总实体
//!
//! 由 delivery_events 全窗口重算得到，可随时删除重建。

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "ad_stats_daily")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub advertisement_id: String,
    pub day_bucket: Date,
    pub impressions: i64,
    pub clicks: i64,
    pub conversions: i64,
    /// Daily spend (micros)
    pub amount_spent: i64,
    /// Click-through rate, percent
    pub ctr: f64,
    /// Cost per click, whole currency units
    pub cpc: f64,
    /// Cost per acquisition, whole currency units
    pub cpa: f64,
    /// Device-class breakdown (JSON, deterministic key order)
    #[sea_orm(column_type = "Text", nullable)]
    pub device_breakdown: Option<String>,
    /// Country breakdown (JSON, deterministic key order)
    #[sea_orm(column_type = "Text", nullable)]
    pub geo_breakdown: Option<String>,
    pub computed_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
