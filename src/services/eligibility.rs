//! 版位投放资格评估
//!
//! evaluate 是只读语义加一处惰性收敛：扫描中发现排期已过或预算
//! 打满却仍是 active 的广告，顺手把它落为 completed。除此之外
//! 不产生任何写入。

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::errors::{AdServeError, Result};
use crate::storage::models::{AdStatus, Advertisement};
use crate::storage::SeaOrmStorage;

/// 评估结果里的单个候选
#[derive(Debug, Clone)]
pub struct EligibleAd {
    pub advertisement: Advertisement,
    pub priority: i32,
}

pub struct EligibilityService {
    storage: Arc<SeaOrmStorage>,
}

impl EligibilityService {
    pub fn new(storage: Arc<SeaOrmStorage>) -> Self {
        Self { storage }
    }

    /// 评估某版位此刻的可投广告，按投放顺序返回
    ///
    /// 排序键：priority 升序，再按 amount_spent 升序（花费少者优先，
    /// 让预算消耗更均匀），最后 created_at 升序保证确定性。
    pub async fn evaluate(&self, placement_id: i64, now: DateTime<Utc>) -> Result<Vec<EligibleAd>> {
        let placement = self
            .storage
            .get_placement(placement_id)
            .await?
            .ok_or_else(|| {
                AdServeError::not_found(format!("Placement not found: {}", placement_id))
            })?;

        // 停用的版位不投任何广告
        if !placement.is_active {
            return Ok(Vec::new());
        }

        let assignments = self.storage.assignments_for_placement(placement_id).await?;
        if assignments.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<String> = assignments
            .iter()
            .map(|a| a.advertisement_id.clone())
            .collect();
        let mut ads = self.storage.get_advertisements_by_ids(&ids).await?;

        // 惰性收敛：排期结束或预算打满的 active 广告落为 completed
        for ad in ads.iter_mut() {
            if ad.status == AdStatus::Active
                && (now > ad.schedule_end || ad.amount_spent >= ad.budget)
            {
                ad.status = AdStatus::Completed;
                ad.updated_at = now;
                self.storage.update_advertisement(ad).await?;
                info!("Advertisement lazily completed: {}", ad.id);
            }
        }

        let impression_counts = self
            .storage
            .impression_counts_for_placement(placement_id)
            .await?;

        let mut eligible: Vec<EligibleAd> = Vec::new();
        for assignment in &assignments {
            let Some(ad) = ads.iter().find(|a| a.id == assignment.advertisement_id) else {
                // 关联指向的广告已被删除，跳过
                continue;
            };

            if !ad.is_active(now) {
                continue;
            }

            // 该版位上的曝光上限
            if let Some(cap) = assignment.max_impressions {
                let served = impression_counts.get(&ad.id).copied().unwrap_or(0);
                if served >= cap {
                    debug!(
                        "Advertisement {} hit impression cap on placement {} ({}/{})",
                        ad.id, placement_id, served, cap
                    );
                    continue;
                }
            }

            // 日预算软顶：当日台账花费达到 daily_budget 后当天不再投放
            if let Some(daily) = ad.daily_budget {
                let spent_today = self
                    .storage
                    .ledger_spent_on_day(&ad.id, now.date_naive())
                    .await?;
                if spent_today >= daily {
                    debug!(
                        "Advertisement {} exhausted daily budget ({} micros)",
                        ad.id, spent_today
                    );
                    continue;
                }
            }

            eligible.push(EligibleAd {
                advertisement: ad.clone(),
                priority: assignment.priority,
            });
        }

        eligible.sort_by(|a, b| {
            a.priority
                .cmp(&b.priority)
                .then(a.advertisement.amount_spent.cmp(&b.advertisement.amount_spent))
                .then(a.advertisement.created_at.cmp(&b.advertisement.created_at))
        });

        Ok(eligible)
    }
}
