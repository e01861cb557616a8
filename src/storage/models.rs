use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use strum::{AsRefStr, EnumIter, EnumString};

/// Micros per whole currency unit. All monetary fields are i64 micros.
pub const MICROS_PER_UNIT: i64 = 1_000_000;

/// Convert micros to whole currency units for derived ratios.
pub fn micros_to_units(micros: i64) -> f64 {
    micros as f64 / MICROS_PER_UNIT as f64
}

/// 广告生命周期状态
///
/// `Expired` 只作为派生的展示状态使用（见 `Advertisement::effective_status`），
/// 状态机不会把它写入存储。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, EnumIter, AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AdStatus {
    #[default]
    Draft,
    PendingApproval,
    Active,
    Paused,
    Completed,
    Rejected,
    Expired,
}

impl std::fmt::Display for AdStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_ref())
    }
}

impl std::str::FromStr for AdStatus {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(Self::Draft),
            "pending_approval" => Ok(Self::PendingApproval),
            "active" => Ok(Self::Active),
            "paused" => Ok(Self::Paused),
            "completed" => Ok(Self::Completed),
            "rejected" => Ok(Self::Rejected),
            "expired" => Ok(Self::Expired),
            _ => Err(format!("Invalid ad status: '{}'", s)),
        }
    }
}

/// 广告类型
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, EnumIter, AsRefStr,
    EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AdType {
    #[default]
    ProductPromotion,
    SellerSpotlight,
    SeasonalCampaign,
    BrandAwareness,
    ValueAddition,
    EquipmentRental,
    TrainingProgram,
    MarketPriceAlert,
}

impl std::fmt::Display for AdType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_ref())
    }
}

/// 投放事件类型
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIter, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EventType {
    Impression,
    Click,
    Conversion,
    View,
    Engagement,
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_ref())
    }
}

impl std::str::FromStr for EventType {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "impression" => Ok(Self::Impression),
            "click" => Ok(Self::Click),
            "conversion" => Ok(Self::Conversion),
            "view" => Ok(Self::View),
            "engagement" => Ok(Self::Engagement),
            _ => Err(format!("Invalid event type: '{}'", s)),
        }
    }
}

/// 计费模型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, EnumIter, AsRefStr)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PricingModel {
    Cpm,
    #[default]
    Cpc,
    Cpa,
    FlatRate,
}

impl std::fmt::Display for PricingModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_ref())
    }
}

impl std::str::FromStr for PricingModel {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cpm" => Ok(Self::Cpm),
            "cpc" => Ok(Self::Cpc),
            "cpa" => Ok(Self::Cpa),
            "flat_rate" => Ok(Self::FlatRate),
            _ => Err(format!("Invalid pricing model: '{}'", s)),
        }
    }
}

/// 定向条件
///
/// 每个已知维度一个可选字段，未知维度落入 `extra` 透传，
/// 内部不把定向当作无类型字典使用。
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TargetingCriteria {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audience: Option<AudienceTargeting>,
    /// Country / region / city lists
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geo: Option<GeoTargeting>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub demographics: Option<DemographicTargeting>,
    /// Relevant product categories
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub categories: Vec<String>,
    /// Forward-compatibility escape hatch for unrecognized dimensions
    #[serde(default, flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AudienceTargeting {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age_range: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub interests: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub behaviors: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct GeoTargeting {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub countries: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub regions: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cities: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DemographicTargeting {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub occupations: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub income_band: Option<String>,
}

/// 广告版位
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Placement {
    pub id: i64,
    pub name: String,
    pub location: String,
    pub dimensions: Option<String>,
    pub max_creative_size_kb: i32,
    /// micros per impression
    pub price_per_impression: i64,
    /// micros per click
    pub price_per_click: i64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// 广告
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Advertisement {
    pub id: String,
    pub advertiser_id: String,
    pub title: String,
    pub description: String,
    pub ad_type: AdType,
    pub campaign_id: Option<String>,
    pub targeting: TargetingCriteria,
    pub banner_image_url: String,
    pub landing_page_url: Option<String>,
    pub video_url: Option<String>,
    pub call_to_action: String,
    pub budget: i64,
    pub daily_budget: Option<i64>,
    pub bid_amount: i64,
    pub pricing_model: PricingModel,
    pub currency: String,
    pub schedule_start: DateTime<Utc>,
    pub schedule_end: DateTime<Utc>,
    pub status: AdStatus,
    pub rejection_reason: Option<String>,
    pub approved_by: Option<String>,
    pub approved_at: Option<DateTime<Utc>>,
    pub impressions: i64,
    pub clicks: i64,
    pub conversions: i64,
    pub amount_spent: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Advertisement {
    /// 投放资格判断（纯函数，每次读取重新计算，不缓存）
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.status == AdStatus::Active
            && self.schedule_start <= now
            && now <= self.schedule_end
            && (self.daily_budget.is_none() || self.amount_spent < self.budget)
    }

    /// 展示状态：排期已结束的广告报告为 expired，存储状态不变
    pub fn effective_status(&self, now: DateTime<Utc>) -> AdStatus {
        if self.schedule_end < now
            && matches!(self.status, AdStatus::Active | AdStatus::Paused)
        {
            AdStatus::Expired
        } else {
            self.status
        }
    }

    /// CTR 百分比
    pub fn click_through_rate(&self) -> f64 {
        if self.impressions == 0 {
            return 0.0;
        }
        self.clicks as f64 / self.impressions as f64 * 100.0
    }

    /// 转化率百分比
    pub fn conversion_rate(&self) -> f64 {
        if self.clicks == 0 {
            return 0.0;
        }
        self.conversions as f64 / self.clicks as f64 * 100.0
    }

    /// 实际 CPC（整币种单位）
    pub fn cost_per_click(&self) -> f64 {
        if self.clicks == 0 {
            return 0.0;
        }
        micros_to_units(self.amount_spent) / self.clicks as f64
    }

    /// 实际 CPA（整币种单位）
    pub fn cost_per_acquisition(&self) -> f64 {
        if self.conversions == 0 {
            return 0.0;
        }
        micros_to_units(self.amount_spent) / self.conversions as f64
    }
}

/// 广告-版位关联
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlacementAssignment {
    pub id: i64,
    pub advertisement_id: String,
    pub placement_id: i64,
    pub priority: i32,
    pub max_impressions: Option<i64>,
    pub assigned_at: DateTime<Utc>,
}

/// 投放事件（只追加）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryEvent {
    pub id: String,
    pub advertisement_id: String,
    pub placement_id: i64,
    pub event_type: EventType,
    pub occurred_at: DateTime<Utc>,
    pub cost: i64,
    pub session_id: Option<String>,
    pub user_ref: Option<String>,
    pub orphaned: bool,
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

/// 天级汇总行
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyStats {
    pub advertisement_id: String,
    pub day_bucket: chrono::NaiveDate,
    pub impressions: i64,
    pub clicks: i64,
    pub conversions: i64,
    pub amount_spent: i64,
    pub ctr: f64,
    pub cpc: f64,
    pub cpa: f64,
    /// device class -> event count, deterministic key order
    pub device_breakdown: BTreeMap<String, i64>,
    /// country -> event count, deterministic key order
    pub geo_breakdown: BTreeMap<String, i64>,
}

/// 广告系列
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Campaign {
    pub id: String,
    pub name: String,
    pub description: String,
    pub campaign_type: String,
    pub manager_id: String,
    pub total_budget: i64,
    pub schedule_start: DateTime<Utc>,
    pub schedule_end: DateTime<Utc>,
    pub target_impressions: Option<i64>,
    pub target_clicks: Option<i64>,
    pub target_conversions: Option<i64>,
    pub target_ctr: Option<f64>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn test_ad(status: AdStatus) -> Advertisement {
        let now = Utc::now();
        Advertisement {
            id: "ad-1".to_string(),
            advertiser_id: "u-1".to_string(),
            title: "Test".to_string(),
            description: String::new(),
            ad_type: AdType::ProductPromotion,
            campaign_id: None,
            targeting: TargetingCriteria::default(),
            banner_image_url: "https://cdn.example.com/banner.png".to_string(),
            landing_page_url: None,
            video_url: None,
            call_to_action: "Learn More".to_string(),
            budget: 100 * MICROS_PER_UNIT,
            daily_budget: None,
            bid_amount: 50_000,
            pricing_model: PricingModel::Cpc,
            currency: "GHS".to_string(),
            schedule_start: now - Duration::days(1),
            schedule_end: now + Duration::days(1),
            status,
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

    #[test]
    fn test_is_active_inside_window() {
        let ad = test_ad(AdStatus::Active);
        assert!(ad.is_active(Utc::now()));
    }

    #[test]
    fn test_is_active_false_outside_window_regardless_of_status() {
        let ad = test_ad(AdStatus::Active);
        assert!(!ad.is_active(Utc::now() + Duration::days(2)));
        assert!(!ad.is_active(Utc::now() - Duration::days(2)));
    }

    #[test]
    fn test_is_active_false_for_non_active_status() {
        for status in [
            AdStatus::Draft,
            AdStatus::PendingApproval,
            AdStatus::Paused,
            AdStatus::Completed,
            AdStatus::Rejected,
        ] {
            assert!(!test_ad(status).is_active(Utc::now()));
        }
    }

    #[test]
    fn test_is_active_daily_budget_gate() {
        let mut ad = test_ad(AdStatus::Active);
        ad.daily_budget = Some(10 * MICROS_PER_UNIT);
        ad.amount_spent = ad.budget;
        assert!(!ad.is_active(Utc::now()));

        ad.amount_spent = ad.budget - 1;
        assert!(ad.is_active(Utc::now()));
    }

    #[test]
    fn test_effective_status_expired() {
        let mut ad = test_ad(AdStatus::Active);
        ad.schedule_end = Utc::now() - Duration::hours(1);
        assert_eq!(ad.effective_status(Utc::now()), AdStatus::Expired);
        // stored status untouched
        assert_eq!(ad.status, AdStatus::Active);
    }

    #[test]
    fn test_derived_ratios() {
        let mut ad = test_ad(AdStatus::Active);
        ad.impressions = 1000;
        ad.clicks = 25;
        ad.conversions = 2;
        ad.amount_spent = 50 * MICROS_PER_UNIT;
        assert_eq!(ad.click_through_rate(), 2.5);
        assert_eq!(ad.cost_per_click(), 2.0);
        assert_eq!(ad.cost_per_acquisition(), 25.0);
        assert_eq!(ad.conversion_rate(), 8.0);
    }

    #[test]
    fn test_derived_ratios_zero_denominators() {
        let ad = test_ad(AdStatus::Active);
        assert_eq!(ad.click_through_rate(), 0.0);
        assert_eq!(ad.cost_per_click(), 0.0);
        assert_eq!(ad.cost_per_acquisition(), 0.0);
    }

    #[test]
    fn test_status_round_trip() {
        for s in ["draft", "pending_approval", "active", "paused", "completed", "rejected"] {
            let parsed: AdStatus = s.parse().unwrap();
            assert_eq!(parsed.to_string(), s);
        }
    }

    #[test]
    fn test_targeting_residual_fields_survive_round_trip() {
        let json = r#"{"audience":{"age_range":"25-34","interests":["maize"]},"custom_dimension":{"k":1}}"#;
        let t: TargetingCriteria = serde_json::from_str(json).unwrap();
        assert_eq!(t.audience.as_ref().unwrap().age_range.as_deref(), Some("25-34"));
        assert!(t.extra.contains_key("custom_dimension"));
        let back = serde_json::to_string(&t).unwrap();
        let t2: TargetingCriteria = serde_json::from_str(&back).unwrap();
        assert_eq!(t, t2);
    }
}
