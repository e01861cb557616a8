//! 投放事件实体（只追加，不更新）
//!
//! 事件成本在记录时刻根据版位定价与广告计费模型固定，
//! 后续定价调整不影响历史事件。

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "delivery_events")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub advertisement_id: String,
    pub placement_id: i64,
    pub event_type: String,
    pub occurred_at: DateTimeUtc,
    /// Cost attributed to this event (micros), fixed at record time
    pub cost: i64,
    pub session_id: Option<String>,
    pub user_ref: Option<String>,
    /// Recorded for audit but excluded from counters and rollups
    pub orphaned: bool,
    /// Opaque key-value metadata (JSON)
    #[sea_orm(column_type = "Text", nullable)]
    pub metadata: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
