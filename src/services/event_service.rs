//! 投放事件记录
//!
//! 事件成本在记录时一次性确定并写死在事件行里，之后调价不回溯。
//! 计费表：
//!   cpm  × impression -> placement.price_per_impression
//!   cpc  × click      -> placement.price_per_click
//!   cpa  × conversion -> advertisement.bid_amount
//!   其余组合（含 flat_rate）-> 0

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::errors::{AdServeError, Result};
use crate::storage::models::{
    AdStatus, Advertisement, DeliveryEvent, EventType, Placement, PricingModel,
};
use crate::storage::SeaOrmStorage;

#[derive(Debug, Clone)]
pub struct RecordEventRequest {
    pub advertisement_id: String,
    pub placement_id: i64,
    pub event_type: EventType,
    pub session_id: Option<String>,
    pub user_ref: Option<String>,
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

/// 记录结果
#[derive(Debug)]
pub struct RecordedEvent {
    pub event_id: String,
    /// 本次事件计入台账的成本（micros）
    pub cost: i64,
    /// 事件被标记为孤立（广告缺失或不可投），计数器未动
    pub orphaned: bool,
    /// 本次事件触发了总预算硬顶，广告已转为 completed
    pub budget_exhausted: bool,
}

/// 单次事件的成本（micros），纯函数
pub fn compute_event_cost(
    pricing_model: PricingModel,
    event_type: EventType,
    placement: &Placement,
    bid_amount: i64,
) -> i64 {
    match (pricing_model, event_type) {
        (PricingModel::Cpm, EventType::Impression) => placement.price_per_impression,
        (PricingModel::Cpc, EventType::Click) => placement.price_per_click,
        (PricingModel::Cpa, EventType::Conversion) => bid_amount,
        _ => 0,
    }
}

pub struct EventService {
    storage: Arc<SeaOrmStorage>,
}

impl EventService {
    pub fn new(storage: Arc<SeaOrmStorage>) -> Self {
        Self { storage }
    }

    /// 记录一条投放事件
    ///
    /// 广告不存在或此刻不可投时，事件以 orphaned 标记落库供审计，
    /// 不更新任何计数器，调用返回成功。正常路径下事件插入与计数器
    /// 自增在同一事务内完成。
    pub async fn record(&self, req: RecordEventRequest) -> Result<RecordedEvent> {
        let placement = self
            .storage
            .get_placement(req.placement_id)
            .await?
            .ok_or_else(|| {
                AdServeError::not_found(format!("Placement not found: {}", req.placement_id))
            })?;

        let now = Utc::now();
        let ad: Option<Advertisement> =
            self.storage.get_advertisement(&req.advertisement_id).await?;

        let Some(ad) = ad.filter(|ad| ad.is_active(now)) else {
            let event = build_event(&req, now, 0, true);
            self.storage.insert_orphaned_event(&event).await?;
            warn!(
                "Orphaned delivery event recorded: {} {} on placement {}",
                event.event_type, event.advertisement_id, event.placement_id
            );
            return Ok(RecordedEvent {
                event_id: event.id,
                cost: 0,
                orphaned: true,
                budget_exhausted: false,
            });
        };

        let cost = compute_event_cost(ad.pricing_model, req.event_type, &placement, ad.bid_amount);

        // 台账预检是软信号：宁可少量超支，不能丢已发生的计费事件，
        // 所以只记日志，事件照常入账
        if let Err(e) = self.check_budget(&ad, cost).await {
            debug!("{}", e.format_simple());
        }

        let event = build_event(&req, now, cost, false);
        let spent_after = self.storage.insert_event_with_counters(&event).await?;

        // 打满即停：触发事件本身保留，超出部分接受（宁可少量超支，
        // 不能丢已发生的计费事件）
        let budget_exhausted = spent_after >= ad.budget && ad.status == AdStatus::Active;
        if budget_exhausted {
            debug!(
                "Advertisement {} exhausted budget ({} / {} micros)",
                ad.id, spent_after, ad.budget
            );
        }

        Ok(RecordedEvent {
            event_id: event.id,
            cost,
            orphaned: false,
            budget_exhausted,
        })
    }

    /// 台账预检：接受该成本是否会突破总预算硬顶
    pub async fn check_budget(&self, ad: &Advertisement, cost: i64) -> Result<()> {
        let spent = self.storage.ledger_spent_total(&ad.id).await?;
        if spent + cost > ad.budget {
            return Err(AdServeError::budget_exceeded(format!(
                "Advertisement {} would exceed budget: {} + {} > {} micros",
                ad.id, spent, cost, ad.budget
            )));
        }
        Ok(())
    }
}

fn build_event(
    req: &RecordEventRequest,
    occurred_at: chrono::DateTime<Utc>,
    cost: i64,
    orphaned: bool,
) -> DeliveryEvent {
    DeliveryEvent {
        id: Uuid::new_v4().to_string(),
        advertisement_id: req.advertisement_id.clone(),
        placement_id: req.placement_id,
        event_type: req.event_type,
        occurred_at,
        cost,
        session_id: req.session_id.clone(),
        user_ref: req.user_ref.clone(),
        orphaned,
        metadata: req.metadata.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn placement() -> Placement {
        Placement {
            id: 1,
            name: "homepage_top".to_string(),
            location: "homepage".to_string(),
            dimensions: Some("728x90".to_string()),
            max_creative_size_kb: 512,
            price_per_impression: 5_000,
            price_per_click: 250_000,
            is_active: true,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_cpm_charges_per_impression() {
        let p = placement();
        assert_eq!(
            compute_event_cost(PricingModel::Cpm, EventType::Impression, &p, 999),
            5_000
        );
        assert_eq!(compute_event_cost(PricingModel::Cpm, EventType::Click, &p, 999), 0);
    }

    #[test]
    fn test_cpc_charges_per_click() {
        let p = placement();
        assert_eq!(
            compute_event_cost(PricingModel::Cpc, EventType::Click, &p, 999),
            250_000
        );
        assert_eq!(
            compute_event_cost(PricingModel::Cpc, EventType::Impression, &p, 999),
            0
        );
    }

    #[test]
    fn test_cpa_charges_bid_on_conversion() {
        let p = placement();
        assert_eq!(
            compute_event_cost(PricingModel::Cpa, EventType::Conversion, &p, 2_000_000),
            2_000_000
        );
        assert_eq!(
            compute_event_cost(PricingModel::Cpa, EventType::Click, &p, 2_000_000),
            0
        );
    }

    #[test]
    fn test_flat_rate_never_charges_per_event() {
        let p = placement();
        for et in [
            EventType::Impression,
            EventType::Click,
            EventType::Conversion,
            EventType::View,
            EventType::Engagement,
        ] {
            assert_eq!(compute_event_cost(PricingModel::FlatRate, et, &p, 999), 0);
        }
    }
}
