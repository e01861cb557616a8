//! 天级汇总编排
//!
//! 聚合本身是纯函数（见 analytics::compute_daily_stats），这里负责
//! 取事件窗口、写回汇总行，以及定时任务用的批量入口和留存清理。
//! 遇到 AggregationConflict 时整窗重算，不做增量修补。

use std::sync::Arc;

use chrono::{Duration, NaiveDate, Utc};
use tracing::{debug, info, warn};

use crate::analytics::{compute_daily_stats, day_bounds};
use crate::errors::{AdServeError, Result};
use crate::storage::models::DailyStats;
use crate::storage::SeaOrmStorage;

/// 整窗重算的最大轮数（每轮内部另有存储层的瞬态重试）
const MAX_WINDOW_ATTEMPTS: u32 = 3;

pub struct AnalyticsService {
    storage: Arc<SeaOrmStorage>,
}

impl AnalyticsService {
    pub fn new(storage: Arc<SeaOrmStorage>) -> Self {
        Self { storage }
    }

    /// 重算某广告某天的汇总并覆盖写回
    ///
    /// 幂等：同一事件集合重复调用得到完全一致的行。
    pub async fn aggregate(&self, advertisement_id: &str, date: NaiveDate) -> Result<DailyStats> {
        let mut last_err = None;
        for attempt in 1..=MAX_WINDOW_ATTEMPTS {
            match self.aggregate_once(advertisement_id, date).await {
                Ok(stats) => return Ok(stats),
                Err(e) if e.is_retryable() && attempt < MAX_WINDOW_ATTEMPTS => {
                    warn!(
                        "Aggregation window retry {}/{} for {} @ {}: {}",
                        attempt, MAX_WINDOW_ATTEMPTS, advertisement_id, date, e
                    );
                    last_err = Some(e);
                }
                Err(e) => return Err(e),
            }
        }
        Err(last_err.unwrap_or_else(|| {
            AdServeError::aggregation_conflict("aggregation retries exhausted")
        }))
    }

    async fn aggregate_once(&self, advertisement_id: &str, date: NaiveDate) -> Result<DailyStats> {
        let (start, end) = day_bounds(date);
        let events = self
            .storage
            .events_for_window(advertisement_id, start, end)
            .await?;
        let stats = compute_daily_stats(advertisement_id, date, &events);
        self.storage.upsert_daily_stats(&stats).await?;
        debug!(
            "Aggregated {} events for {} @ {}",
            events.len(),
            advertisement_id,
            date
        );
        Ok(stats)
    }

    /// 重算一段日期范围（含两端），回填历史用
    pub async fn aggregate_range(
        &self,
        advertisement_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<DailyStats>> {
        if from > to {
            return Err(AdServeError::validation(
                "Range start must not be after range end",
            ));
        }
        let mut results = Vec::new();
        let mut day = from;
        while day <= to {
            results.push(self.aggregate(advertisement_id, day).await?);
            day += Duration::days(1);
        }
        Ok(results)
    }

    /// 汇总某天所有有事件的广告，返回处理的广告数
    ///
    /// 单个广告失败只记日志，不中断整批。
    pub async fn aggregate_day_for_all(&self, date: NaiveDate) -> Result<usize> {
        let ids = self.storage.ad_ids_with_events(date).await?;
        let mut processed = 0;
        for id in &ids {
            match self.aggregate(id, date).await {
                Ok(_) => processed += 1,
                Err(e) => warn!("Aggregation failed for {} @ {}: {}", id, date, e),
            }
        }
        if processed > 0 {
            info!("Daily rollup complete: {} advertisements @ {}", processed, date);
        }
        Ok(processed)
    }

    /// 查询日期范围内的汇总行
    ///
    /// 范围覆盖到今天时先把今天的窗口惰性重算一遍，读到的
    /// 当日数据不会落后于事件流。重算失败不阻塞读取。
    pub async fn get_analytics(
        &self,
        advertisement_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<DailyStats>> {
        if from > to {
            return Err(AdServeError::validation(
                "Range start must not be after range end",
            ));
        }
        let today = Utc::now().date_naive();
        if from <= today && today <= to {
            if let Err(e) = self.aggregate(advertisement_id, today).await {
                warn!(
                    "Lazy same-day aggregation failed for {}: {}",
                    advertisement_id, e
                );
            }
        }
        self.storage.get_daily_stats(advertisement_id, from, to).await
    }

    /// 解析 YYYY-MM-DD
    pub fn parse_date(s: &str) -> Result<NaiveDate> {
        NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|_| {
            AdServeError::date_parse(format!("Invalid date '{}', expected YYYY-MM-DD", s))
        })
    }

    /// 按配置的留存期清理过期数据，返回 (删除的事件数, 删除的汇总行数)
    ///
    /// 事件窗口必须长于汇总已经覆盖的范围，否则会丢数据——
    /// 调用方通过配置保证 event_retention_days < stats_retention_days。
    pub async fn cleanup_expired(
        &self,
        event_retention_days: u64,
        stats_retention_days: u64,
    ) -> Result<(u64, u64)> {
        let now = Utc::now();
        let event_cutoff = now - Duration::days(event_retention_days as i64);
        let stats_cutoff = (now - Duration::days(stats_retention_days as i64)).date_naive();

        let events_deleted = self.storage.delete_events_before(event_cutoff).await?;
        let stats_deleted = self.storage.delete_stats_before(stats_cutoff).await?;

        if events_deleted > 0 || stats_deleted > 0 {
            info!(
                "Retention cleanup: {} events, {} daily stats rows deleted",
                events_deleted, stats_deleted
            );
        }
        Ok((events_deleted, stats_deleted))
    }
}
