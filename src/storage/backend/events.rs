//! 投放事件写入与查询
//!
//! 事件插入与广告计数器更新在同一个数据库事务内完成；
//! 计数器使用 SQL 原位自增（counter = counter + n），
//! 并发写入方之间不存在读-改-写竞态。

use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::ActiveValue::Set;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ColumnTrait, ConnectionTrait, DbErr, EntityTrait, ExprTrait, QueryFilter, QueryOrder,
    QuerySelect, TransactionTrait,
};
use tracing::debug;

use super::SeaOrmStorage;
use super::converters::model_to_event;
use super::retry;
use crate::errors::{AdServeError, Result};
use crate::storage::models::{AdStatus, DeliveryEvent, EventType};
use migration::entities::{advertisement, delivery_event};

fn event_to_active_model(event: &DeliveryEvent) -> Result<delivery_event::ActiveModel> {
    let metadata = if event.metadata.is_empty() {
        None
    } else {
        Some(serde_json::to_string(&event.metadata)?)
    };

    Ok(delivery_event::ActiveModel {
        id: Set(event.id.clone()),
        advertisement_id: Set(event.advertisement_id.clone()),
        placement_id: Set(event.placement_id),
        event_type: Set(event.event_type.to_string()),
        occurred_at: Set(event.occurred_at),
        cost: Set(event.cost),
        session_id: Set(event.session_id.clone()),
        user_ref: Set(event.user_ref.clone()),
        orphaned: Set(event.orphaned),
        metadata: Set(metadata),
    })
}

/// 事务内执行：插入事件 + 原子自增计数器 + 硬顶判定
async fn apply_event_txn<C: ConnectionTrait>(
    conn: &C,
    event: &delivery_event::ActiveModel,
    source: &DeliveryEvent,
) -> std::result::Result<i64, DbErr> {
    delivery_event::Entity::insert(event.clone()).exec(conn).await?;

    let mut update = advertisement::Entity::update_many()
        .col_expr(
            advertisement::Column::AmountSpent,
            Expr::col(advertisement::Column::AmountSpent).add(source.cost),
        )
        .col_expr(
            advertisement::Column::UpdatedAt,
            Expr::value(source.occurred_at),
        );

    update = match source.event_type {
        EventType::Impression => update.col_expr(
            advertisement::Column::Impressions,
            Expr::col(advertisement::Column::Impressions).add(1i64),
        ),
        EventType::Click => update.col_expr(
            advertisement::Column::Clicks,
            Expr::col(advertisement::Column::Clicks).add(1i64),
        ),
        EventType::Conversion => update.col_expr(
            advertisement::Column::Conversions,
            Expr::col(advertisement::Column::Conversions).add(1i64),
        ),
        // view / engagement 只影响花费
        EventType::View | EventType::Engagement => update,
    };

    update
        .filter(advertisement::Column::Id.eq(source.advertisement_id.as_str()))
        .exec(conn)
        .await?;

    // 读取更新后的花费，判定硬顶
    let model = advertisement::Entity::find_by_id(source.advertisement_id.as_str())
        .one(conn)
        .await?
        .ok_or_else(|| DbErr::RecordNotFound(source.advertisement_id.clone()))?;

    // 预算打满：广告在同一事务内转为 completed（触发事件仍然保留）
    if model.amount_spent >= model.budget && model.status == AdStatus::Active.to_string() {
        advertisement::Entity::update_many()
            .col_expr(
                advertisement::Column::Status,
                Expr::value(AdStatus::Completed.to_string()),
            )
            .filter(advertisement::Column::Id.eq(source.advertisement_id.as_str()))
            .exec(conn)
            .await?;
    }

    Ok(model.amount_spent)
}

impl SeaOrmStorage {
    /// 记录事件并更新计数器（单事务）
    ///
    /// 返回应用后的 amount_spent，供预算台账判定使用。
    pub async fn insert_event_with_counters(&self, event: &DeliveryEvent) -> Result<i64> {
        let active = event_to_active_model(event)?;
        let db = self.get_db();

        let spent = retry::with_retry("insert_event_with_counters", self.retry_config(), || {
            let active = active.clone();
            async move {
                let txn = db.begin().await?;
                let spent = apply_event_txn(&txn, &active, event).await?;
                txn.commit().await?;
                Ok(spent)
            }
        })
        .await?;

        debug!(
            "Delivery event applied: {} {} on placement {} (cost {} micros)",
            event.event_type, event.advertisement_id, event.placement_id, event.cost
        );
        Ok(spent)
    }

    /// 记录孤立事件（审计保留，不更新任何计数器）
    pub async fn insert_orphaned_event(&self, event: &DeliveryEvent) -> Result<()> {
        let active = event_to_active_model(event)?;
        let db = self.get_db();
        retry::with_retry("insert_orphaned_event", self.retry_config(), || {
            let active = active.clone();
            async move {
                delivery_event::Entity::insert(active).exec(db).await?;
                Ok(())
            }
        })
        .await?;
        Ok(())
    }

    /// 某版位上各广告的有效曝光计数（评估器的曝光上限检查）
    pub async fn impression_counts_for_placement(
        &self,
        placement_id: i64,
    ) -> Result<std::collections::HashMap<String, i64>> {
        let rows: Vec<(String, i64)> = delivery_event::Entity::find()
            .select_only()
            .column(delivery_event::Column::AdvertisementId)
            .column_as(delivery_event::Column::Id.count(), "cnt")
            .filter(delivery_event::Column::PlacementId.eq(placement_id))
            .filter(delivery_event::Column::EventType.eq(EventType::Impression.to_string()))
            .filter(delivery_event::Column::Orphaned.eq(false))
            .group_by(delivery_event::Column::AdvertisementId)
            .into_tuple()
            .all(self.get_db())
            .await?;

        Ok(rows.into_iter().collect())
    }

    /// 聚合窗口内的有效事件（按时间升序）
    pub async fn events_for_window(
        &self,
        advertisement_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<DeliveryEvent>> {
        let models = delivery_event::Entity::find()
            .filter(delivery_event::Column::AdvertisementId.eq(advertisement_id))
            .filter(delivery_event::Column::OccurredAt.gte(start))
            .filter(delivery_event::Column::OccurredAt.lt(end))
            .filter(delivery_event::Column::Orphaned.eq(false))
            .order_by_asc(delivery_event::Column::OccurredAt)
            .all(self.get_db())
            .await?;

        models.into_iter().map(model_to_event).collect()
    }

    /// 广告的累计有效花费（台账口径：所有被接受事件的 cost 之和）
    pub async fn ledger_spent_total(&self, advertisement_id: &str) -> Result<i64> {
        let events = self
            .events_for_window(
                advertisement_id,
                DateTime::<Utc>::MIN_UTC,
                DateTime::<Utc>::MAX_UTC,
            )
            .await?;
        Ok(events.iter().map(|e| e.cost).sum())
    }

    /// 当日（UTC）已产生的有效花费，daily_budget 软顶检查用
    pub async fn ledger_spent_on_day(
        &self,
        advertisement_id: &str,
        date: NaiveDate,
    ) -> Result<i64> {
        let (start, end) = crate::analytics::day_bounds(date);
        let events = self
            .events_for_window(advertisement_id, start, end)
            .await?;
        Ok(events.iter().map(|e| e.cost).sum())
    }

    /// 某天有事件记录的广告 id 列表（批量聚合入口）
    pub async fn ad_ids_with_events(&self, date: NaiveDate) -> Result<Vec<String>> {
        let (start, end) = crate::analytics::day_bounds(date);
        let rows: Vec<String> = delivery_event::Entity::find()
            .select_only()
            .column(delivery_event::Column::AdvertisementId)
            .distinct()
            .filter(delivery_event::Column::OccurredAt.gte(start))
            .filter(delivery_event::Column::OccurredAt.lt(end))
            .filter(delivery_event::Column::Orphaned.eq(false))
            .into_tuple()
            .all(self.get_db())
            .await?;
        Ok(rows)
    }

    /// 删除早于 cutoff 的事件（按日期分区的保留策略）
    pub async fn delete_events_before(&self, cutoff: DateTime<Utc>) -> Result<u64> {
        let result = delivery_event::Entity::delete_many()
            .filter(delivery_event::Column::OccurredAt.lt(cutoff))
            .exec(self.get_db())
            .await?;
        Ok(result.rows_affected)
    }

    /// 单个事件查询（测试与审计）
    pub async fn get_event(&self, id: &str) -> Result<Option<DeliveryEvent>> {
        let model = delivery_event::Entity::find_by_id(id)
            .one(self.get_db())
            .await?;
        model.map(model_to_event).transpose()
    }

    /// 广告的全部事件（含孤立事件，审计用）
    pub async fn all_events_for_ad(&self, advertisement_id: &str) -> Result<Vec<DeliveryEvent>> {
        let models = delivery_event::Entity::find()
            .filter(delivery_event::Column::AdvertisementId.eq(advertisement_id))
            .order_by_asc(delivery_event::Column::OccurredAt)
            .all(self.get_db())
            .await?;
        models.into_iter().map(model_to_event).collect()
    }

    pub(crate) fn map_aggregation_err(err: DbErr) -> AdServeError {
        if retry::is_retryable_error(&err) {
            AdServeError::aggregation_conflict(err.to_string())
        } else {
            AdServeError::from(err)
        }
    }
}
