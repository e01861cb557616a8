//! 广告实体
//!
//! 计数器字段（impressions/clicks/conversions/amount_spent）只由
//! 事件写入路径更新，其它调用方只读。金额统一使用 micros。

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "advertisements")]
pub struct Model {
    /// Opaque UUID token
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub advertiser_id: String,
    pub title: String,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    pub ad_type: String,
    pub campaign_id: Option<String>,
    /// Targeting criteria (JSON, see storage::models::TargetingCriteria)
    #[sea_orm(column_type = "Text")]
    pub targeting: String,
    pub banner_image_url: String,
    pub landing_page_url: Option<String>,
    pub video_url: Option<String>,
    pub call_to_action: String,
    /// Total budget (micros)
    pub budget: i64,
    /// Optional daily soft cap (micros)
    pub daily_budget: Option<i64>,
    /// Bid amount (micros), charged per conversion under CPA
    pub bid_amount: i64,
    pub pricing_model: String,
    pub currency: String,
    pub schedule_start: DateTimeUtc,
    pub schedule_end: DateTimeUtc,
    pub status: String,
    pub rejection_reason: Option<String>,
    pub approved_by: Option<String>,
    pub approved_at: Option<DateTimeUtc>,
    pub impressions: i64,
    pub clicks: i64,
    pub conversions: i64,
    /// Cumulative spend (micros); authoritative mirror of event costs
    pub amount_spent: i64,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
