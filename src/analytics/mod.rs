//! 聚合共享类型与工具
//!
//! - 日期窗口换算（UTC 日界）
//! - 事件 metadata 的地理/设备归类（缺失或无法解析一律落 "unknown" 桶）

pub mod device;

pub use device::classify_device;

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use std::collections::BTreeMap;

use crate::storage::models::{micros_to_units, DailyStats, DeliveryEvent, EventType};

/// metadata 中聚合器识别的键
pub const META_COUNTRY: &str = "country";
pub const META_USER_AGENT: &str = "user_agent";

/// 缺失/非法维度的兜底桶
pub const UNKNOWN_BUCKET: &str = "unknown";

/// 将时间戳截断到所在 UTC 日
pub fn truncate_to_day(ts: DateTime<Utc>) -> NaiveDate {
    ts.date_naive()
}

/// 某个 UTC 日的 [start, end) 窗口
pub fn day_bounds(date: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = Utc
        .from_utc_datetime(&date.and_hms_opt(0, 0, 0).expect("midnight is always valid"));
    let end = start + chrono::Duration::days(1);
    (start, end)
}

/// 从事件窗口计算一行天级汇总（纯函数，幂等）
///
/// 相同的事件集合重复计算必须得到完全一致的结果，
/// breakdown 使用 BTreeMap 保证序列化后的键序稳定。
pub fn compute_daily_stats(
    advertisement_id: &str,
    day: NaiveDate,
    events: &[DeliveryEvent],
) -> DailyStats {
    let mut impressions = 0i64;
    let mut clicks = 0i64;
    let mut conversions = 0i64;
    let mut amount_spent = 0i64;
    let mut device_breakdown: BTreeMap<String, i64> = BTreeMap::new();
    let mut geo_breakdown: BTreeMap<String, i64> = BTreeMap::new();

    for event in events {
        match event.event_type {
            EventType::Impression => impressions += 1,
            EventType::Click => clicks += 1,
            EventType::Conversion => conversions += 1,
            EventType::View | EventType::Engagement => {}
        }
        amount_spent += event.cost;

        let country = event
            .metadata
            .get(META_COUNTRY)
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())
            .unwrap_or(UNKNOWN_BUCKET);
        *geo_breakdown.entry(country.to_string()).or_insert(0) += 1;

        let device = event
            .metadata
            .get(META_USER_AGENT)
            .and_then(|v| v.as_str())
            .map(classify_device)
            .unwrap_or(UNKNOWN_BUCKET);
        *device_breakdown.entry(device.to_string()).or_insert(0) += 1;
    }

    let ctr = if impressions > 0 {
        clicks as f64 / impressions as f64 * 100.0
    } else {
        0.0
    };
    let cpc = if clicks > 0 {
        micros_to_units(amount_spent) / clicks as f64
    } else {
        0.0
    };
    let cpa = if conversions > 0 {
        micros_to_units(amount_spent) / conversions as f64
    } else {
        0.0
    };

    DailyStats {
        advertisement_id: advertisement_id.to_string(),
        day_bucket: day,
        impressions,
        clicks,
        conversions,
        amount_spent,
        ctr,
        cpc,
        cpa,
        device_breakdown,
        geo_breakdown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::models::MICROS_PER_UNIT;
    use chrono::Duration;

    fn event(event_type: EventType, cost: i64, meta: &[(&str, &str)]) -> DeliveryEvent {
        let mut metadata = serde_json::Map::new();
        for (k, v) in meta {
            metadata.insert(k.to_string(), serde_json::Value::String(v.to_string()));
        }
        DeliveryEvent {
            id: uuid::Uuid::new_v4().to_string(),
            advertisement_id: "ad-1".to_string(),
            placement_id: 1,
            event_type,
            occurred_at: Utc::now(),
            cost,
            session_id: None,
            user_ref: None,
            orphaned: false,
            metadata,
        }
    }

    #[test]
    fn test_day_bounds_cover_exactly_one_day() {
        let date = NaiveDate::from_ymd_opt(2026, 8, 10).unwrap();
        let (start, end) = day_bounds(date);
        assert_eq!(end - start, Duration::days(1));
        assert_eq!(truncate_to_day(start), date);
        assert_eq!(truncate_to_day(end - Duration::seconds(1)), date);
    }

    #[test]
    fn test_compute_daily_stats_counts_and_breakdowns() {
        // 1000 曝光 / 25 点击 / 2 转化 / 花费 50 -> ctr 2.5, cpc 2.0, cpa 25.0
        let mut events = Vec::new();
        for _ in 0..1000 {
            events.push(event(EventType::Impression, 0, &[]));
        }
        for _ in 0..25 {
            events.push(event(EventType::Click, 2 * MICROS_PER_UNIT, &[]));
        }
        for _ in 0..2 {
            events.push(event(EventType::Conversion, 0, &[]));
        }

        let day = NaiveDate::from_ymd_opt(2026, 8, 10).unwrap();
        let stats = compute_daily_stats("ad-1", day, &events);
        assert_eq!(stats.impressions, 1000);
        assert_eq!(stats.clicks, 25);
        assert_eq!(stats.conversions, 2);
        assert_eq!(stats.amount_spent, 50 * MICROS_PER_UNIT);
        assert_eq!(stats.ctr, 2.5);
        assert_eq!(stats.cpc, 2.0);
        assert_eq!(stats.cpa, 25.0);
    }

    #[test]
    fn test_compute_daily_stats_idempotent() {
        let events = vec![
            event(EventType::Impression, 1000, &[("country", "GH"), ("user_agent", "Mozilla/5.0 (Linux; Android 14) Chrome/120 Mobile Safari")]),
            event(EventType::Click, 50_000, &[("country", "NG")]),
        ];
        let day = NaiveDate::from_ymd_opt(2026, 8, 10).unwrap();
        let a = compute_daily_stats("ad-1", day, &events);
        let b = compute_daily_stats("ad-1", day, &events);
        assert_eq!(a, b);
        assert_eq!(
            serde_json::to_string(&a.geo_breakdown).unwrap(),
            serde_json::to_string(&b.geo_breakdown).unwrap()
        );
    }

    #[test]
    fn test_malformed_metadata_degrades_to_unknown() {
        let mut e = event(EventType::Impression, 0, &[]);
        e.metadata.insert(
            "country".to_string(),
            serde_json::Value::Number(serde_json::Number::from(7)),
        );
        let day = NaiveDate::from_ymd_opt(2026, 8, 10).unwrap();
        let stats = compute_daily_stats("ad-1", day, &[e]);
        assert_eq!(stats.geo_breakdown.get("unknown"), Some(&1));
        assert_eq!(stats.device_breakdown.get("unknown"), Some(&1));
    }

    #[test]
    fn test_zero_denominators() {
        let day = NaiveDate::from_ymd_opt(2026, 8, 10).unwrap();
        let stats = compute_daily_stats("ad-1", day, &[]);
        assert_eq!(stats.ctr, 0.0);
        assert_eq!(stats.cpc, 0.0);
        assert_eq!(stats.cpa, 0.0);
    }
}
