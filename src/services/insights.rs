//! 报表与优化建议
//!
//! 总览直接读广告计数器（实时），单广告明细读天级汇总表。
//! 优化建议通过 RecommendationStrategy 注入，默认实现是一组
//! 可配置阈值规则；嵌入方可以换成自己的策略。

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{NaiveDate, Utc};

use crate::config::get_config;
use crate::errors::{AdServeError, Result};
use crate::storage::models::{micros_to_units, AdStatus, MICROS_PER_UNIT};
use crate::storage::{AdFilter, SeaOrmStorage};

use super::ad_service::Caller;
use super::analytics_service::AnalyticsService;

/// Top 榜入选的最低曝光量，样本太小的 CTR 没有参考意义
const TOP_CTR_MIN_IMPRESSIONS: i64 = 100;

/// 策略输入：一个广告在观察期内的表现快照
#[derive(Debug, Clone)]
pub struct PerformanceSnapshot {
    pub impressions: i64,
    pub clicks: i64,
    pub conversions: i64,
    /// micros
    pub amount_spent: i64,
    /// 百分比
    pub ctr: f64,
    /// 百分比
    pub conversion_rate: f64,
    /// micros
    pub cpc: i64,
}

/// 优化建议策略
pub trait RecommendationStrategy: Send + Sync {
    fn recommend(&self, snapshot: &PerformanceSnapshot) -> Vec<String>;
}

/// 默认策略：逐条对照阈值
#[derive(Debug, Clone)]
pub struct ThresholdRules {
    /// CTR 低于该百分比时建议更新创意
    pub ctr_floor: f64,
    /// CPC 高于该值（micros）时建议调整定向或出价
    pub cpc_ceiling: i64,
    /// 曝光低于该值时建议扩大预算或放宽定向
    pub min_impressions: i64,
    /// 转化率低于该百分比时建议优化落地页
    pub conversion_rate_floor: f64,
}

impl ThresholdRules {
    pub fn from_config() -> Self {
        let cfg = get_config();
        Self {
            ctr_floor: cfg.insights.ctr_floor,
            cpc_ceiling: cfg.insights.cpc_ceiling,
            min_impressions: cfg.insights.min_impressions,
            conversion_rate_floor: cfg.insights.conversion_rate_floor,
        }
    }
}

impl RecommendationStrategy for ThresholdRules {
    fn recommend(&self, s: &PerformanceSnapshot) -> Vec<String> {
        let mut out = Vec::new();
        if s.ctr < self.ctr_floor {
            out.push(
                "Consider updating your ad creative to improve click-through rate".to_string(),
            );
        }
        if s.cpc > self.cpc_ceiling {
            out.push("Consider adjusting targeting or bid to reduce cost per click".to_string());
        }
        if s.impressions < self.min_impressions {
            out.push(
                "Consider increasing budget or expanding targeting to reach more users"
                    .to_string(),
            );
        }
        if s.conversion_rate < self.conversion_rate_floor {
            out.push("Consider optimizing your landing page to improve conversions".to_string());
        }
        out
    }
}

/// Top 榜单条目
#[derive(Debug, Clone)]
pub struct TopAd {
    pub advertisement_id: String,
    pub title: String,
    pub metric: f64,
}

/// 广告主（或全局）总览
#[derive(Debug, Clone)]
pub struct OverviewStats {
    pub total_advertisements: usize,
    pub active_advertisements: usize,
    pub pending_advertisements: usize,
    pub total_campaigns: usize,
    pub total_impressions: i64,
    pub total_clicks: i64,
    pub total_conversions: i64,
    /// micros
    pub total_spent: i64,
    /// 百分比
    pub overall_ctr: f64,
    /// 百分比
    pub overall_conversion_rate: f64,
    /// 整币种单位
    pub average_cpc: f64,
    /// CTR 降序，样本量达标者
    pub top_by_ctr: Vec<TopAd>,
    /// 转化数降序
    pub top_by_conversions: Vec<TopAd>,
}

/// 单广告表现明细
#[derive(Debug, Clone)]
pub struct AdPerformance {
    pub advertisement_id: String,
    pub title: String,
    pub status: AdStatus,
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub impressions: i64,
    pub clicks: i64,
    pub conversions: i64,
    /// micros
    pub amount_spent: i64,
    /// 百分比
    pub ctr: f64,
    /// 百分比
    pub conversion_rate: f64,
    /// 整币种单位
    pub cpc: f64,
    /// 整币种单位
    pub cpa: f64,
    /// 百分比，按配置的单次转化价值估算
    pub estimated_roi: f64,
    pub device_breakdown: BTreeMap<String, i64>,
    pub geo_breakdown: BTreeMap<String, i64>,
    pub daily: Vec<crate::storage::models::DailyStats>,
    pub recommendations: Vec<String>,
}

/// 估算 ROI 百分比：((转化价值合计 - 花费) / 花费) * 100
///
/// 花费为 0 时返回 0，避免除零把空跑广告排到榜首。
pub fn estimated_roi(conversions: i64, amount_spent: i64, value_per_conversion: i64) -> f64 {
    if amount_spent <= 0 {
        return 0.0;
    }
    let revenue = conversions as f64 * value_per_conversion as f64;
    (revenue - amount_spent as f64) / amount_spent as f64 * 100.0
}

pub struct InsightsService {
    storage: Arc<SeaOrmStorage>,
    analytics: AnalyticsService,
    strategy: Box<dyn RecommendationStrategy>,
}

impl InsightsService {
    /// 使用配置阈值的默认策略
    pub fn new(storage: Arc<SeaOrmStorage>) -> Self {
        Self::with_strategy(storage, Box::new(ThresholdRules::from_config()))
    }

    pub fn with_strategy(
        storage: Arc<SeaOrmStorage>,
        strategy: Box<dyn RecommendationStrategy>,
    ) -> Self {
        let analytics = AnalyticsService::new(storage.clone());
        Self {
            storage,
            analytics,
            strategy,
        }
    }

    /// 广告主视角的总览；审核角色看到全局
    pub async fn overview(&self, caller: &Caller) -> Result<OverviewStats> {
        let filter = AdFilter {
            advertiser_id: if caller.is_staff {
                None
            } else {
                Some(caller.id.clone())
            },
            ..AdFilter::default()
        };
        let ads = self.storage.list_advertisements(&filter).await?;
        let campaigns = self
            .storage
            .list_campaigns(if caller.is_staff {
                None
            } else {
                Some(caller.id.as_str())
            })
            .await?;
        let now = Utc::now();
        let top_n = get_config().insights.top_n;

        let total_impressions: i64 = ads.iter().map(|a| a.impressions).sum();
        let total_clicks: i64 = ads.iter().map(|a| a.clicks).sum();
        let total_conversions: i64 = ads.iter().map(|a| a.conversions).sum();
        let total_spent: i64 = ads.iter().map(|a| a.amount_spent).sum();

        let overall_ctr = if total_impressions > 0 {
            total_clicks as f64 / total_impressions as f64 * 100.0
        } else {
            0.0
        };
        let overall_conversion_rate = if total_clicks > 0 {
            total_conversions as f64 / total_clicks as f64 * 100.0
        } else {
            0.0
        };
        let average_cpc = if total_clicks > 0 {
            micros_to_units(total_spent) / total_clicks as f64
        } else {
            0.0
        };

        let mut by_ctr: Vec<TopAd> = ads
            .iter()
            .filter(|a| a.impressions >= TOP_CTR_MIN_IMPRESSIONS)
            .map(|a| TopAd {
                advertisement_id: a.id.clone(),
                title: a.title.clone(),
                metric: a.click_through_rate(),
            })
            .collect();
        by_ctr.sort_by(|a, b| b.metric.total_cmp(&a.metric));
        by_ctr.truncate(top_n);

        let mut by_conversions: Vec<TopAd> = ads
            .iter()
            .filter(|a| a.conversions > 0)
            .map(|a| TopAd {
                advertisement_id: a.id.clone(),
                title: a.title.clone(),
                metric: a.conversions as f64,
            })
            .collect();
        by_conversions.sort_by(|a, b| b.metric.total_cmp(&a.metric));
        by_conversions.truncate(top_n);

        Ok(OverviewStats {
            total_advertisements: ads.len(),
            active_advertisements: ads.iter().filter(|a| a.is_active(now)).count(),
            pending_advertisements: ads
                .iter()
                .filter(|a| a.status == AdStatus::PendingApproval)
                .count(),
            total_campaigns: campaigns.len(),
            total_impressions,
            total_clicks,
            total_conversions,
            total_spent,
            overall_ctr,
            overall_conversion_rate,
            average_cpc,
            top_by_ctr: by_ctr,
            top_by_conversions: by_conversions,
        })
    }

    /// 单广告的观察期表现明细（读天级汇总，含惰性当日重算）
    pub async fn ad_performance(
        &self,
        caller: &Caller,
        advertisement_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<AdPerformance> {
        let ad = self
            .storage
            .get_advertisement(advertisement_id)
            .await?
            .ok_or_else(|| {
                AdServeError::not_found(format!("Advertisement not found: {}", advertisement_id))
            })?;
        if !caller.is_staff && ad.advertiser_id != caller.id {
            return Err(AdServeError::not_found(format!(
                "Advertisement not found: {}",
                advertisement_id
            )));
        }

        let daily = self.analytics.get_analytics(advertisement_id, from, to).await?;

        let impressions: i64 = daily.iter().map(|d| d.impressions).sum();
        let clicks: i64 = daily.iter().map(|d| d.clicks).sum();
        let conversions: i64 = daily.iter().map(|d| d.conversions).sum();
        let amount_spent: i64 = daily.iter().map(|d| d.amount_spent).sum();

        let ctr = if impressions > 0 {
            clicks as f64 / impressions as f64 * 100.0
        } else {
            0.0
        };
        let conversion_rate = if clicks > 0 {
            conversions as f64 / clicks as f64 * 100.0
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

        let mut device_breakdown: BTreeMap<String, i64> = BTreeMap::new();
        let mut geo_breakdown: BTreeMap<String, i64> = BTreeMap::new();
        for row in &daily {
            for (k, v) in &row.device_breakdown {
                *device_breakdown.entry(k.clone()).or_insert(0) += v;
            }
            for (k, v) in &row.geo_breakdown {
                *geo_breakdown.entry(k.clone()).or_insert(0) += v;
            }
        }

        let snapshot = PerformanceSnapshot {
            impressions,
            clicks,
            conversions,
            amount_spent,
            ctr,
            conversion_rate,
            cpc: (cpc * MICROS_PER_UNIT as f64) as i64,
        };
        let recommendations = self.strategy.recommend(&snapshot);

        let value_per_conversion = get_config().analytics.value_per_conversion;

        Ok(AdPerformance {
            advertisement_id: ad.id,
            title: ad.title,
            status: ad.status,
            from,
            to,
            impressions,
            clicks,
            conversions,
            amount_spent,
            ctr,
            conversion_rate,
            cpc,
            cpa,
            estimated_roi: estimated_roi(conversions, amount_spent, value_per_conversion),
            device_breakdown,
            geo_breakdown,
            daily,
            recommendations,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules() -> ThresholdRules {
        ThresholdRules {
            ctr_floor: 1.0,
            cpc_ceiling: 500_000,
            min_impressions: 1000,
            conversion_rate_floor: 2.0,
        }
    }

    fn healthy_snapshot() -> PerformanceSnapshot {
        PerformanceSnapshot {
            impressions: 5000,
            clicks: 100,
            conversions: 5,
            amount_spent: 20 * MICROS_PER_UNIT,
            ctr: 2.0,
            conversion_rate: 5.0,
            cpc: 200_000,
        }
    }

    #[test]
    fn test_healthy_ad_gets_no_recommendations() {
        assert!(rules().recommend(&healthy_snapshot()).is_empty());
    }

    #[test]
    fn test_low_ctr_triggers_creative_advice() {
        let mut s = healthy_snapshot();
        s.ctr = 0.5;
        let recs = rules().recommend(&s);
        assert_eq!(recs.len(), 1);
        assert!(recs[0].contains("creative"));
    }

    #[test]
    fn test_high_cpc_triggers_bid_advice() {
        let mut s = healthy_snapshot();
        s.cpc = 750_000;
        let recs = rules().recommend(&s);
        assert!(recs.iter().any(|r| r.contains("cost per click")));
    }

    #[test]
    fn test_low_volume_triggers_reach_advice() {
        let mut s = healthy_snapshot();
        s.impressions = 200;
        let recs = rules().recommend(&s);
        assert!(recs.iter().any(|r| r.contains("reach more users")));
    }

    #[test]
    fn test_struggling_ad_collects_all_applicable_advice() {
        let s = PerformanceSnapshot {
            impressions: 100,
            clicks: 0,
            conversions: 0,
            amount_spent: 0,
            ctr: 0.0,
            conversion_rate: 0.0,
            cpc: 0,
        };
        assert_eq!(rules().recommend(&s).len(), 3);
    }

    #[test]
    fn test_estimated_roi() {
        // 2 conversions * 50 units - 50 units spent = +100%
        assert_eq!(
            estimated_roi(2, 50 * MICROS_PER_UNIT, 50 * MICROS_PER_UNIT),
            100.0
        );
    }

    #[test]
    fn test_estimated_roi_zero_spend() {
        assert_eq!(estimated_roi(10, 0, 50 * MICROS_PER_UNIT), 0.0);
    }

    #[test]
    fn test_estimated_roi_negative() {
        // no conversions, pure loss
        assert_eq!(estimated_roi(0, 10 * MICROS_PER_UNIT, 50 * MICROS_PER_UNIT), -100.0);
    }
}
