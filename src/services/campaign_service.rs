//! 广告系列管理与跨广告汇总

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::info;
use uuid::Uuid;

use crate::errors::{AdServeError, Result};
use crate::storage::models::{micros_to_units, Campaign};
use crate::storage::{AdFilter, SeaOrmStorage};

#[derive(Debug, Clone)]
pub struct CreateCampaignRequest {
    pub name: String,
    pub description: String,
    pub campaign_type: String,
    pub manager_id: String,
    /// micros
    pub total_budget: i64,
    pub schedule_start: DateTime<Utc>,
    pub schedule_end: DateTime<Utc>,
    pub target_impressions: Option<i64>,
    pub target_clicks: Option<i64>,
    pub target_conversions: Option<i64>,
    pub target_ctr: Option<f64>,
}

/// 单个目标的完成度
#[derive(Debug, Clone, PartialEq)]
pub struct GoalProgress {
    pub target: i64,
    pub actual: i64,
    /// 未封顶的完成百分比，可超过 100
    pub percent: f64,
}

impl GoalProgress {
    fn new(target: i64, actual: i64) -> Self {
        let percent = if target > 0 {
            actual as f64 / target as f64 * 100.0
        } else {
            0.0
        };
        Self {
            target,
            actual,
            percent,
        }
    }

    /// 展示层封顶值，存储的 percent 不截断
    pub fn capped_percent(&self) -> f64 {
        self.percent.min(100.0)
    }
}

/// 广告系列的实时汇总（读取时跨广告累加计数器，不落库）
#[derive(Debug, Clone)]
pub struct CampaignPerformance {
    pub campaign_id: String,
    pub campaign_name: String,
    pub total_advertisements: usize,
    pub active_advertisements: usize,
    pub total_impressions: i64,
    pub total_clicks: i64,
    pub total_conversions: i64,
    /// micros
    pub total_spent: i64,
    /// micros，花费超出预算时为 0
    pub budget_remaining: i64,
    /// 百分比
    pub campaign_ctr: f64,
    /// 百分比
    pub campaign_conversion_rate: f64,
    pub impressions_goal: Option<GoalProgress>,
    pub clicks_goal: Option<GoalProgress>,
    pub conversions_goal: Option<GoalProgress>,
}

pub struct CampaignService {
    storage: Arc<SeaOrmStorage>,
}

impl CampaignService {
    pub fn new(storage: Arc<SeaOrmStorage>) -> Self {
        Self { storage }
    }

    pub async fn create(&self, req: CreateCampaignRequest) -> Result<Campaign> {
        if req.name.trim().is_empty() {
            return Err(AdServeError::validation("Campaign name is required"));
        }
        if req.total_budget <= 0 {
            return Err(AdServeError::validation("Budget must be greater than 0"));
        }
        if req.schedule_start >= req.schedule_end {
            return Err(AdServeError::validation("End date must be after start date"));
        }

        let now = Utc::now();
        let campaign = Campaign {
            id: Uuid::new_v4().to_string(),
            name: req.name.trim().to_string(),
            description: req.description,
            campaign_type: req.campaign_type,
            manager_id: req.manager_id,
            total_budget: req.total_budget,
            schedule_start: req.schedule_start,
            schedule_end: req.schedule_end,
            target_impressions: req.target_impressions,
            target_clicks: req.target_clicks,
            target_conversions: req.target_conversions,
            target_ctr: req.target_ctr,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        self.storage.insert_campaign(&campaign).await?;
        Ok(campaign)
    }

    pub async fn get(&self, id: &str) -> Result<Campaign> {
        self.storage
            .get_campaign(id)
            .await?
            .ok_or_else(|| AdServeError::not_found(format!("Campaign not found: {}", id)))
    }

    pub async fn list(&self, manager_id: Option<&str>) -> Result<Vec<Campaign>> {
        self.storage.list_campaigns(manager_id).await
    }

    /// 广告系列的跨广告实时汇总
    pub async fn performance(&self, id: &str) -> Result<CampaignPerformance> {
        let campaign = self.get(id).await?;
        let ads = self
            .storage
            .list_advertisements(&AdFilter {
                campaign_id: Some(id.to_string()),
                ..AdFilter::default()
            })
            .await?;

        let now = Utc::now();
        let total_impressions: i64 = ads.iter().map(|a| a.impressions).sum();
        let total_clicks: i64 = ads.iter().map(|a| a.clicks).sum();
        let total_conversions: i64 = ads.iter().map(|a| a.conversions).sum();
        let total_spent: i64 = ads.iter().map(|a| a.amount_spent).sum();
        let active_advertisements = ads.iter().filter(|a| a.is_active(now)).count();

        let campaign_ctr = if total_impressions > 0 {
            total_clicks as f64 / total_impressions as f64 * 100.0
        } else {
            0.0
        };
        let campaign_conversion_rate = if total_clicks > 0 {
            total_conversions as f64 / total_clicks as f64 * 100.0
        } else {
            0.0
        };

        let performance = CampaignPerformance {
            campaign_id: campaign.id.clone(),
            campaign_name: campaign.name.clone(),
            total_advertisements: ads.len(),
            active_advertisements,
            total_impressions,
            total_clicks,
            total_conversions,
            total_spent,
            budget_remaining: (campaign.total_budget - total_spent).max(0),
            campaign_ctr,
            campaign_conversion_rate,
            impressions_goal: campaign
                .target_impressions
                .map(|t| GoalProgress::new(t, total_impressions)),
            clicks_goal: campaign
                .target_clicks
                .map(|t| GoalProgress::new(t, total_clicks)),
            conversions_goal: campaign
                .target_conversions
                .map(|t| GoalProgress::new(t, total_conversions)),
        };

        info!(
            "Campaign performance computed: {} ({} ads, {} spent)",
            campaign.name,
            ads.len(),
            micros_to_units(total_spent)
        );
        Ok(performance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_goal_progress_percent() {
        let g = GoalProgress::new(1000, 250);
        assert_eq!(g.percent, 25.0);
        assert_eq!(g.capped_percent(), 25.0);
    }

    #[test]
    fn test_goal_progress_exceeding_target_is_capped_for_display_only() {
        let g = GoalProgress::new(100, 150);
        assert_eq!(g.percent, 150.0);
        assert_eq!(g.capped_percent(), 100.0);
    }

    #[test]
    fn test_goal_progress_zero_target() {
        let g = GoalProgress::new(0, 50);
        assert_eq!(g.percent, 0.0);
    }
}
