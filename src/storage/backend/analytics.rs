//! 天级汇总行的持久化
//!
//! upsert 以 (advertisement_id, day_bucket) 为键整行覆盖，
//! 不做增量修补，保证聚合重算的幂等性。

use chrono::{NaiveDate, Utc};
use sea_orm::ActiveValue::{NotSet, Set};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder};
use tracing::debug;

use super::SeaOrmStorage;
use super::converters::model_to_daily_stats;
use super::retry;
use crate::errors::Result;
use crate::storage::models::DailyStats;
use migration::entities::ad_stats_daily;

impl SeaOrmStorage {
    /// 整行覆盖式 upsert
    pub async fn upsert_daily_stats(&self, stats: &DailyStats) -> Result<()> {
        let db = self.get_db();
        let device_json = serde_json::to_string(&stats.device_breakdown)?;
        let geo_json = serde_json::to_string(&stats.geo_breakdown)?;
        let computed_at = Utc::now();

        let existing = ad_stats_daily::Entity::find()
            .filter(ad_stats_daily::Column::AdvertisementId.eq(stats.advertisement_id.as_str()))
            .filter(ad_stats_daily::Column::DayBucket.eq(stats.day_bucket))
            .one(db)
            .await
            .map_err(Self::map_aggregation_err)?;

        let model = ad_stats_daily::ActiveModel {
            id: match &existing {
                Some(row) => Set(row.id),
                None => NotSet,
            },
            advertisement_id: Set(stats.advertisement_id.clone()),
            day_bucket: Set(stats.day_bucket),
            impressions: Set(stats.impressions),
            clicks: Set(stats.clicks),
            conversions: Set(stats.conversions),
            amount_spent: Set(stats.amount_spent),
            ctr: Set(stats.ctr),
            cpc: Set(stats.cpc),
            cpa: Set(stats.cpa),
            device_breakdown: Set(Some(device_json)),
            geo_breakdown: Set(Some(geo_json)),
            computed_at: Set(computed_at),
        };

        let result = if existing.is_some() {
            retry::with_retry("update_daily_stats", self.retry_config(), || async {
                ad_stats_daily::Entity::update(model.clone()).exec(db).await?;
                Ok(())
            })
            .await
        } else {
            retry::with_retry("insert_daily_stats", self.retry_config(), || async {
                ad_stats_daily::Entity::insert(model.clone()).exec(db).await?;
                Ok(())
            })
            .await
        };

        result.map_err(Self::map_aggregation_err)?;

        debug!(
            "Daily stats upserted: {} @ {}",
            stats.advertisement_id, stats.day_bucket
        );
        Ok(())
    }

    /// 日期范围查询，按日期升序
    pub async fn get_daily_stats(
        &self,
        advertisement_id: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<DailyStats>> {
        let models = ad_stats_daily::Entity::find()
            .filter(ad_stats_daily::Column::AdvertisementId.eq(advertisement_id))
            .filter(ad_stats_daily::Column::DayBucket.gte(from))
            .filter(ad_stats_daily::Column::DayBucket.lte(to))
            .order_by_asc(ad_stats_daily::Column::DayBucket)
            .all(self.get_db())
            .await?;
        Ok(models.into_iter().map(model_to_daily_stats).collect())
    }

    /// 单行查询（幂等性测试用）
    pub async fn get_daily_stats_row(
        &self,
        advertisement_id: &str,
        day: NaiveDate,
    ) -> Result<Option<DailyStats>> {
        let model = ad_stats_daily::Entity::find()
            .filter(ad_stats_daily::Column::AdvertisementId.eq(advertisement_id))
            .filter(ad_stats_daily::Column::DayBucket.eq(day))
            .one(self.get_db())
            .await?;
        Ok(model.map(model_to_daily_stats))
    }

    /// 删除早于 cutoff 的汇总行（派生表可随时重建）
    pub async fn delete_stats_before(&self, cutoff: NaiveDate) -> Result<u64> {
        let result = ad_stats_daily::Entity::delete_many()
            .filter(ad_stats_daily::Column::DayBucket.lt(cutoff))
            .exec(self.get_db())
            .await?;
        Ok(result.rows_affected)
    }
}
