//! EventService 集成测试
//!
//! 覆盖计费归因、计数器推进、孤立事件和预算硬顶。

use chrono::{Duration, Utc};
use std::sync::{Arc, Once};
use tempfile::TempDir;

use adserve::config::init_config;
use adserve::errors::AdServeError;
use adserve::services::{EventService, RecordEventRequest};
use adserve::storage::backend::SeaOrmStorage;
use adserve::storage::{
    AdStatus, AdType, Advertisement, EventType, Placement, PricingModel, TargetingCriteria,
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
    let path = td.path().join("event_service_test.db");
    let url = format!("sqlite://{}?mode=rwc", path.display());
    let storage = Arc::new(SeaOrmStorage::new(&url, "sqlite").await.unwrap());
    (storage, td)
}

async fn seed_placement(storage: &SeaOrmStorage) -> Placement {
    storage
        .insert_placement(&Placement {
            id: 0,
            name: "homepage_top".to_string(),
            location: "homepage".to_string(),
            dimensions: None,
            max_creative_size_kb: 512,
            price_per_impression: 5_000,
            price_per_click: 5_000_000,
            is_active: true,
            created_at: Utc::now(),
        })
        .await
        .unwrap()
}

fn serving_ad(id: &str, pricing_model: PricingModel, budget: i64) -> Advertisement {
    let now = Utc::now();
    Advertisement {
        id: id.to_string(),
        advertiser_id: "seller-1".to_string(),
        title: format!("Ad {}", id),
        description: String::new(),
        ad_type: AdType::ProductPromotion,
        campaign_id: None,
        targeting: TargetingCriteria::default(),
        banner_image_url: "https://cdn.example.com/banner.png".to_string(),
        landing_page_url: None,
        video_url: None,
        call_to_action: "Learn More".to_string(),
        budget,
        daily_budget: None,
        bid_amount: 2_000_000,
        pricing_model,
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

fn request(ad_id: &str, placement_id: i64, event_type: EventType) -> RecordEventRequest {
    RecordEventRequest {
        advertisement_id: ad_id.to_string(),
        placement_id,
        event_type,
        session_id: Some("sess-1".to_string()),
        user_ref: None,
        metadata: serde_json::Map::new(),
    }
}

// =============================================================================
// 计费归因
// =============================================================================

#[cfg(test)]
mod cost_attribution_tests {
    use super::*;

    #[tokio::test]
    async fn test_cpc_click_charges_placement_price() {
        let (storage, _td) = create_temp_storage().await;
        let placement = seed_placement(&storage).await;
        storage
            .insert_advertisement(&serving_ad("ad-1", PricingModel::Cpc, 100_000_000))
            .await
            .unwrap();

        let service = EventService::new(storage.clone());
        let recorded = service
            .record(request("ad-1", placement.id, EventType::Click))
            .await
            .unwrap();
        assert!(!recorded.orphaned);
        assert_eq!(recorded.cost, 5_000_000);

        let ad = storage.get_advertisement("ad-1").await.unwrap().unwrap();
        assert_eq!(ad.clicks, 1);
        assert_eq!(ad.amount_spent, 5_000_000);
    }

    #[tokio::test]
    async fn test_cpc_impression_is_free() {
        let (storage, _td) = create_temp_storage().await;
        let placement = seed_placement(&storage).await;
        storage
            .insert_advertisement(&serving_ad("ad-1", PricingModel::Cpc, 100_000_000))
            .await
            .unwrap();

        let service = EventService::new(storage.clone());
        let recorded = service
            .record(request("ad-1", placement.id, EventType::Impression))
            .await
            .unwrap();
        assert_eq!(recorded.cost, 0);

        let ad = storage.get_advertisement("ad-1").await.unwrap().unwrap();
        assert_eq!(ad.impressions, 1);
        assert_eq!(ad.amount_spent, 0);
    }

    #[tokio::test]
    async fn test_cpa_conversion_charges_bid() {
        let (storage, _td) = create_temp_storage().await;
        let placement = seed_placement(&storage).await;
        storage
            .insert_advertisement(&serving_ad("ad-1", PricingModel::Cpa, 100_000_000))
            .await
            .unwrap();

        let service = EventService::new(storage.clone());
        let recorded = service
            .record(request("ad-1", placement.id, EventType::Conversion))
            .await
            .unwrap();
        assert_eq!(recorded.cost, 2_000_000);
    }

    #[tokio::test]
    async fn test_cost_is_fixed_at_record_time() {
        let (storage, _td) = create_temp_storage().await;
        let placement = seed_placement(&storage).await;
        storage
            .insert_advertisement(&serving_ad("ad-1", PricingModel::Cpc, 100_000_000))
            .await
            .unwrap();

        let service = EventService::new(storage.clone());
        let first = service
            .record(request("ad-1", placement.id, EventType::Click))
            .await
            .unwrap();

        // 调价只影响之后的事件
        let mut repriced = placement.clone();
        repriced.price_per_click = 1_000_000;
        storage.update_placement(&repriced).await.unwrap();

        let second = service
            .record(request("ad-1", placement.id, EventType::Click))
            .await
            .unwrap();

        assert_eq!(first.cost, 5_000_000);
        assert_eq!(second.cost, 1_000_000);
        let stored = storage.get_event(&first.event_id).await.unwrap().unwrap();
        assert_eq!(stored.cost, 5_000_000);
    }
}

// =============================================================================
// 孤立事件
// =============================================================================

#[cfg(test)]
mod orphan_tests {
    use super::*;

    #[tokio::test]
    async fn test_unknown_placement_is_hard_error() {
        let (storage, _td) = create_temp_storage().await;
        let service = EventService::new(storage);
        let err = service
            .record(request("ad-1", 9999, EventType::Click))
            .await
            .unwrap_err();
        assert!(matches!(err, AdServeError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_missing_ad_records_orphan() {
        let (storage, _td) = create_temp_storage().await;
        let placement = seed_placement(&storage).await;
        let service = EventService::new(storage.clone());

        let recorded = service
            .record(request("ghost-ad", placement.id, EventType::Click))
            .await
            .unwrap();
        assert!(recorded.orphaned);
        assert_eq!(recorded.cost, 0);

        let stored = storage.get_event(&recorded.event_id).await.unwrap().unwrap();
        assert!(stored.orphaned);
    }

    #[tokio::test]
    async fn test_paused_ad_records_orphan_without_counters() {
        let (storage, _td) = create_temp_storage().await;
        let placement = seed_placement(&storage).await;
        let mut ad = serving_ad("ad-1", PricingModel::Cpc, 100_000_000);
        ad.status = AdStatus::Paused;
        storage.insert_advertisement(&ad).await.unwrap();

        let service = EventService::new(storage.clone());
        let recorded = service
            .record(request("ad-1", placement.id, EventType::Click))
            .await
            .unwrap();
        assert!(recorded.orphaned);

        let after = storage.get_advertisement("ad-1").await.unwrap().unwrap();
        assert_eq!(after.clicks, 0);
        assert_eq!(after.amount_spent, 0);
    }
}

// =============================================================================
// 预算硬顶
// =============================================================================

#[cfg(test)]
mod budget_tests {
    use super::*;

    #[tokio::test]
    async fn test_budget_exhaustion_stops_serving_after_20_clicks() {
        let (storage, _td) = create_temp_storage().await;
        let placement = seed_placement(&storage).await;
        // 预算 100，单次点击 5：恰好 20 次点击打满
        storage
            .insert_advertisement(&serving_ad("ad-1", PricingModel::Cpc, 100_000_000))
            .await
            .unwrap();

        let service = EventService::new(storage.clone());
        let mut exhausted_at = None;
        for i in 1..=25 {
            let recorded = service
                .record(request("ad-1", placement.id, EventType::Click))
                .await
                .unwrap();
            if recorded.budget_exhausted && exhausted_at.is_none() {
                exhausted_at = Some(i);
            }
            if recorded.orphaned {
                break;
            }
        }

        assert_eq!(exhausted_at, Some(20));
        let ad = storage.get_advertisement("ad-1").await.unwrap().unwrap();
        assert_eq!(ad.status, AdStatus::Completed);
        assert_eq!(ad.amount_spent, 100_000_000);
        assert_eq!(ad.clicks, 20);

        // 后续事件只能以孤立形式落库
        let tail = service
            .record(request("ad-1", placement.id, EventType::Click))
            .await
            .unwrap();
        assert!(tail.orphaned);
    }
}
