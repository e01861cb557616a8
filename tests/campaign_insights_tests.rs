//! 广告系列汇总与报表集成测试

use chrono::{Duration, Utc};
use std::sync::{Arc, Once};
use tempfile::TempDir;

use adserve::config::init_config;
use adserve::errors::AdServeError;
use adserve::services::{
    AnalyticsService, CampaignService, Caller, CreateCampaignRequest, InsightsService,
    PerformanceSnapshot, RecommendationStrategy,
};
use adserve::storage::backend::SeaOrmStorage;
use adserve::storage::{
    AdStatus, AdType, Advertisement, DeliveryEvent, EventType, PricingModel, TargetingCriteria,
};

static INIT: Once = Once::new();

fn init_test_config() {
    INIT.call_once(|| {
        init_config();
    });
}

async fn create_temp_storage() -> (Arc<SeaOrmStorage>, TempDir) {
    init_test_config();
    let td = TempDir::new().unwrap();
    let path = td.path().join("campaign_insights_test.db");
    let url = format!("sqlite://{}?mode=rwc", path.display());
    let storage = Arc::new(SeaOrmStorage::new(&url, "sqlite").await.unwrap());
    (storage, td)
}

fn campaign_request() -> CreateCampaignRequest {
    let now = Utc::now();
    CreateCampaignRequest {
        name: "Harvest Season".to_string(),
        description: "Seasonal push".to_string(),
        campaign_type: "seasonal".to_string(),
        manager_id: "mgr-1".to_string(),
        total_budget: 500_000_000,
        schedule_start: now,
        schedule_end: now + Duration::days(30),
        target_impressions: Some(1000),
        target_clicks: Some(100),
        target_conversions: None,
        target_ctr: None,
    }
}

fn seeded_ad(id: &str, advertiser: &str, campaign_id: Option<&str>) -> Advertisement {
    let now = Utc::now();
    Advertisement {
        id: id.to_string(),
        advertiser_id: advertiser.to_string(),
        title: format!("Ad {}", id),
        description: String::new(),
        ad_type: AdType::SeasonalCampaign,
        campaign_id: campaign_id.map(|s| s.to_string()),
        targeting: TargetingCriteria::default(),
        banner_image_url: "https://cdn.example.com/banner.png".to_string(),
        landing_page_url: None,
        video_url: None,
        call_to_action: "Learn More".to_string(),
        budget: 100_000_000,
        daily_budget: None,
        bid_amount: 50_000,
        pricing_model: PricingModel::Cpc,
        currency: "GHS".to_string(),
        schedule_start: now - Duration::days(1),
        schedule_end: now + Duration::days(7),
        status: AdStatus::Active,
        rejection_reason: None,
        approved_by: None,
        approved_at: None,
        impressions: 0,
        clicks: 0,
        conversions: 0,
        amount_spent: 0,
        created_at: now,
        updated_at: now,
    }
}

fn counted_ad(
    id: &str,
    advertiser: &str,
    campaign_id: Option<&str>,
    impressions: i64,
    clicks: i64,
    conversions: i64,
    amount_spent: i64,
) -> Advertisement {
    let mut ad = seeded_ad(id, advertiser, campaign_id);
    ad.impressions = impressions;
    ad.clicks = clicks;
    ad.conversions = conversions;
    ad.amount_spent = amount_spent;
    ad
}

fn event_now(ad_id: &str, event_type: EventType, cost: i64) -> DeliveryEvent {
    DeliveryEvent {
        id: uuid::Uuid::new_v4().to_string(),
        advertisement_id: ad_id.to_string(),
        placement_id: 1,
        event_type,
        occurred_at: Utc::now(),
        cost,
        session_id: None,
        user_ref: None,
        orphaned: false,
        metadata: serde_json::Map::new(),
    }
}

// =============================================================================
// 广告系列汇总
// =============================================================================

#[cfg(test)]
mod campaign_tests {
    use super::*;

    #[tokio::test]
    async fn test_create_validates_budget_and_schedule() {
        let (storage, _td) = create_temp_storage().await;
        let service = CampaignService::new(storage);

        let mut bad_budget = campaign_request();
        bad_budget.total_budget = 0;
        assert!(matches!(
            service.create(bad_budget).await.unwrap_err(),
            AdServeError::Validation(_)
        ));

        let mut bad_schedule = campaign_request();
        bad_schedule.schedule_end = bad_schedule.schedule_start - Duration::days(1);
        assert!(matches!(
            service.create(bad_schedule).await.unwrap_err(),
            AdServeError::Validation(_)
        ));
    }

    #[tokio::test]
    async fn test_performance_sums_member_ads() {
        let (storage, _td) = create_temp_storage().await;
        let service = CampaignService::new(storage.clone());
        let campaign = service.create(campaign_request()).await.unwrap();

        storage
            .insert_advertisement(&counted_ad(
                "ad-1",
                "seller-1",
                Some(&campaign.id),
                600,
                30,
                3,
                60_000_000,
            ))
            .await
            .unwrap();
        storage
            .insert_advertisement(&counted_ad(
                "ad-2",
                "seller-2",
                Some(&campaign.id),
                400,
                10,
                1,
                40_000_000,
            ))
            .await
            .unwrap();
        // 不属于该系列的广告不计入
        storage
            .insert_advertisement(&counted_ad("ad-3", "seller-1", None, 999, 99, 9, 1))
            .await
            .unwrap();

        let perf = service.performance(&campaign.id).await.unwrap();
        assert_eq!(perf.total_advertisements, 2);
        assert_eq!(perf.total_impressions, 1000);
        assert_eq!(perf.total_clicks, 40);
        assert_eq!(perf.total_spent, 100_000_000);
        assert_eq!(perf.budget_remaining, 400_000_000);
        assert_eq!(perf.campaign_ctr, 4.0);
        assert_eq!(perf.campaign_conversion_rate, 10.0);
    }

    #[tokio::test]
    async fn test_goal_progress_is_uncapped_in_data() {
        let (storage, _td) = create_temp_storage().await;
        let service = CampaignService::new(storage.clone());
        let campaign = service.create(campaign_request()).await.unwrap();

        storage
            .insert_advertisement(&counted_ad(
                "ad-1",
                "seller-1",
                Some(&campaign.id),
                2500,
                50,
                0,
                0,
            ))
            .await
            .unwrap();

        let perf = service.performance(&campaign.id).await.unwrap();
        let goal = perf.impressions_goal.unwrap();
        // 数据层不封顶，展示层封顶
        assert_eq!(goal.percent, 250.0);
        assert_eq!(goal.capped_percent(), 100.0);
        assert_eq!(perf.clicks_goal.unwrap().percent, 50.0);
        assert!(perf.conversions_goal.is_none());
    }
}

// =============================================================================
// 总览与单广告报表
// =============================================================================

#[cfg(test)]
mod insights_tests {
    use super::*;

    #[tokio::test]
    async fn test_overview_scopes_and_ranks() {
        let (storage, _td) = create_temp_storage().await;

        // seller-1：一条高 CTR、一条样本不足
        storage
            .insert_advertisement(&counted_ad("ad-hot", "seller-1", None, 1000, 50, 5, 0))
            .await
            .unwrap();
        storage
            .insert_advertisement(&counted_ad("ad-thin", "seller-1", None, 10, 9, 0, 0))
            .await
            .unwrap();
        // 别人的广告
        storage
            .insert_advertisement(&counted_ad("ad-other", "seller-2", None, 500, 5, 1, 0))
            .await
            .unwrap();

        let service = InsightsService::new(storage);
        let overview = service.overview(&Caller::advertiser("seller-1")).await.unwrap();
        assert_eq!(overview.total_advertisements, 2);
        assert_eq!(overview.total_impressions, 1010);
        assert_eq!(overview.total_clicks, 59);

        // 样本量不足 100 曝光的不进 CTR 榜
        assert_eq!(overview.top_by_ctr.len(), 1);
        assert_eq!(overview.top_by_ctr[0].advertisement_id, "ad-hot");
        assert_eq!(overview.top_by_conversions.len(), 1);

        // 审核角色看到全局
        let global = service.overview(&Caller::staff("admin-1")).await.unwrap();
        assert_eq!(global.total_advertisements, 3);
    }

    #[tokio::test]
    async fn test_ad_performance_totals_and_roi() {
        let (storage, _td) = create_temp_storage().await;
        storage
            .insert_advertisement(&seeded_ad("ad-1", "seller-1", None))
            .await
            .unwrap();

        // 2 转化 × 默认 50 单位转化价值 = 100，花费 50 -> ROI +100%
        for _ in 0..1000 {
            storage
                .insert_event_with_counters(&event_now("ad-1", EventType::Impression, 0))
                .await
                .unwrap();
        }
        for _ in 0..25 {
            storage
                .insert_event_with_counters(&event_now("ad-1", EventType::Click, 2_000_000))
                .await
                .unwrap();
        }
        for _ in 0..2 {
            storage
                .insert_event_with_counters(&event_now("ad-1", EventType::Conversion, 0))
                .await
                .unwrap();
        }

        let analytics = AnalyticsService::new(storage.clone());
        let today = Utc::now().date_naive();
        analytics.aggregate("ad-1", today).await.unwrap();

        let service = InsightsService::new(storage);
        let perf = service
            .ad_performance(&Caller::advertiser("seller-1"), "ad-1", today, today)
            .await
            .unwrap();

        assert_eq!(perf.impressions, 1000);
        assert_eq!(perf.clicks, 25);
        assert_eq!(perf.conversions, 2);
        assert_eq!(perf.amount_spent, 50_000_000);
        assert_eq!(perf.ctr, 2.5);
        assert_eq!(perf.cpc, 2.0);
        assert_eq!(perf.cpa, 25.0);
        assert_eq!(perf.estimated_roi, 100.0);
        assert_eq!(perf.daily.len(), 1);
    }

    #[tokio::test]
    async fn test_ad_performance_enforces_ownership() {
        let (storage, _td) = create_temp_storage().await;
        storage
            .insert_advertisement(&seeded_ad("ad-1", "seller-1", None))
            .await
            .unwrap();

        let service = InsightsService::new(storage);
        let today = Utc::now().date_naive();
        let err = service
            .ad_performance(&Caller::advertiser("seller-2"), "ad-1", today, today)
            .await
            .unwrap_err();
        assert!(matches!(err, AdServeError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_custom_strategy_is_pluggable() {
        struct AlwaysScaleUp;
        impl RecommendationStrategy for AlwaysScaleUp {
            fn recommend(&self, _snapshot: &PerformanceSnapshot) -> Vec<String> {
                vec!["Scale up".to_string()]
            }
        }

        let (storage, _td) = create_temp_storage().await;
        storage
            .insert_advertisement(&seeded_ad("ad-1", "seller-1", None))
            .await
            .unwrap();

        let service = InsightsService::with_strategy(storage, Box::new(AlwaysScaleUp));
        let today = Utc::now().date_naive();
        let perf = service
            .ad_performance(&Caller::advertiser("seller-1"), "ad-1", today, today)
            .await
            .unwrap();
        assert_eq!(perf.recommendations, vec!["Scale up".to_string()]);
    }
}
