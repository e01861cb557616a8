//! Sea-ORM Model 与领域模型之间的转换

use sea_orm::ActiveValue::{NotSet, Set};

use crate::errors::{AdServeError, Result};
use crate::storage::models::{
    Advertisement, Campaign, DailyStats, DeliveryEvent, Placement, PlacementAssignment,
    TargetingCriteria,
};
use migration::entities::{
    ad_stats_daily, advertisement, campaign, delivery_event, placement, placement_assignment,
};

/// 将 Sea-ORM Model 转换为 Placement
pub fn model_to_placement(model: placement::Model) -> Placement {
    Placement {
        id: model.id,
        name: model.name,
        location: model.location,
        dimensions: model.dimensions,
        max_creative_size_kb: model.max_creative_size_kb,
        price_per_impression: model.price_per_impression,
        price_per_click: model.price_per_click,
        is_active: model.is_active,
        created_at: model.created_at,
    }
}

/// 将 Sea-ORM Model 转换为 Advertisement
///
/// 存储中的枚举字段或定向 JSON 非法时返回 Serialization 错误，
/// 不做静默降级。
pub fn model_to_advertisement(model: advertisement::Model) -> Result<Advertisement> {
    let targeting: TargetingCriteria = serde_json::from_str(&model.targeting)
        .map_err(|e| AdServeError::serialization(format!("广告 {} 定向解析失败: {}", model.id, e)))?;

    Ok(Advertisement {
        status: model
            .status
            .parse()
            .map_err(AdServeError::serialization)?,
        ad_type: model
            .ad_type
            .parse()
            .map_err(|_| AdServeError::serialization(format!("Invalid ad type: {}", model.ad_type)))?,
        pricing_model: model
            .pricing_model
            .parse()
            .map_err(AdServeError::serialization)?,
        id: model.id,
        advertiser_id: model.advertiser_id,
        title: model.title,
        description: model.description,
        campaign_id: model.campaign_id,
        targeting,
        banner_image_url: model.banner_image_url,
        landing_page_url: model.landing_page_url,
        video_url: model.video_url,
        call_to_action: model.call_to_action,
        budget: model.budget,
        daily_budget: model.daily_budget,
        bid_amount: model.bid_amount,
        currency: model.currency,
        schedule_start: model.schedule_start,
        schedule_end: model.schedule_end,
        rejection_reason: model.rejection_reason,
        approved_by: model.approved_by,
        approved_at: model.approved_at,
        impressions: model.impressions,
        clicks: model.clicks,
        conversions: model.conversions,
        amount_spent: model.amount_spent,
        created_at: model.created_at,
        updated_at: model.updated_at,
    })
}

/// 将 Advertisement 转换为 ActiveModel（用于插入/更新）
///
/// 计数器字段只在新建时写入，更新路径保持 NotSet，
/// 保证事件管道是计数器的唯一写入方。
pub fn advertisement_to_active_model(
    ad: &Advertisement,
    is_new: bool,
) -> Result<advertisement::ActiveModel> {
    let targeting = serde_json::to_string(&ad.targeting)?;

    Ok(advertisement::ActiveModel {
        id: Set(ad.id.clone()),
        advertiser_id: Set(ad.advertiser_id.clone()),
        title: Set(ad.title.clone()),
        description: Set(ad.description.clone()),
        ad_type: Set(ad.ad_type.to_string()),
        campaign_id: Set(ad.campaign_id.clone()),
        targeting: Set(targeting),
        banner_image_url: Set(ad.banner_image_url.clone()),
        landing_page_url: Set(ad.landing_page_url.clone()),
        video_url: Set(ad.video_url.clone()),
        call_to_action: Set(ad.call_to_action.clone()),
        budget: Set(ad.budget),
        daily_budget: Set(ad.daily_budget),
        bid_amount: Set(ad.bid_amount),
        pricing_model: Set(ad.pricing_model.to_string()),
        currency: Set(ad.currency.clone()),
        schedule_start: Set(ad.schedule_start),
        schedule_end: Set(ad.schedule_end),
        status: Set(ad.status.to_string()),
        rejection_reason: Set(ad.rejection_reason.clone()),
        approved_by: Set(ad.approved_by.clone()),
        approved_at: Set(ad.approved_at),
        impressions: if is_new { Set(ad.impressions) } else { NotSet },
        clicks: if is_new { Set(ad.clicks) } else { NotSet },
        conversions: if is_new { Set(ad.conversions) } else { NotSet },
        amount_spent: if is_new { Set(ad.amount_spent) } else { NotSet },
        created_at: if is_new { Set(ad.created_at) } else { NotSet },
        updated_at: Set(ad.updated_at),
    })
}

/// 将 Sea-ORM Model 转换为 PlacementAssignment
pub fn model_to_assignment(model: placement_assignment::Model) -> PlacementAssignment {
    PlacementAssignment {
        id: model.id,
        advertisement_id: model.advertisement_id,
        placement_id: model.placement_id,
        priority: model.priority,
        max_impressions: model.max_impressions,
        assigned_at: model.assigned_at,
    }
}

/// 将 Sea-ORM Model 转换为 DeliveryEvent
pub fn model_to_event(model: delivery_event::Model) -> Result<DeliveryEvent> {
    let metadata = match model.metadata.as_deref() {
        Some(raw) if !raw.is_empty() => serde_json::from_str(raw).unwrap_or_default(),
        _ => serde_json::Map::new(),
    };

    Ok(DeliveryEvent {
        event_type: model
            .event_type
            .parse()
            .map_err(AdServeError::serialization)?,
        id: model.id,
        advertisement_id: model.advertisement_id,
        placement_id: model.placement_id,
        occurred_at: model.occurred_at,
        cost: model.cost,
        session_id: model.session_id,
        user_ref: model.user_ref,
        orphaned: model.orphaned,
        metadata,
    })
}

/// 将 Sea-ORM Model 转换为 DailyStats
pub fn model_to_daily_stats(model: ad_stats_daily::Model) -> DailyStats {
    // 旧行缺失 breakdown 时降级为空表，不报错
    let device_breakdown = model
        .device_breakdown
        .as_deref()
        .and_then(|raw| serde_json::from_str(raw).ok())
        .unwrap_or_default();
    let geo_breakdown = model
        .geo_breakdown
        .as_deref()
        .and_then(|raw| serde_json::from_str(raw).ok())
        .unwrap_or_default();

    DailyStats {
        advertisement_id: model.advertisement_id,
        day_bucket: model.day_bucket,
        impressions: model.impressions,
        clicks: model.clicks,
        conversions: model.conversions,
        amount_spent: model.amount_spent,
        ctr: model.ctr,
        cpc: model.cpc,
        cpa: model.cpa,
        device_breakdown,
        geo_breakdown,
    }
}

/// 将 Sea-ORM Model 转换为 Campaign
pub fn model_to_campaign(model: campaign::Model) -> Campaign {
    Campaign {
        id: model.id,
        name: model.name,
        description: model.description,
        campaign_type: model.campaign_type,
        manager_id: model.manager_id,
        total_budget: model.total_budget,
        schedule_start: model.schedule_start,
        schedule_end: model.schedule_end,
        target_impressions: model.target_impressions,
        target_clicks: model.target_clicks,
        target_conversions: model.target_conversions,
        target_ctr: model.target_ctr,
        is_active: model.is_active,
        created_at: model.created_at,
        updated_at: model.updated_at,
    }
}
