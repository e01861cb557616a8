//! 版位、广告、关联、广告系列的基础存取操作

use chrono::Utc;
use sea_orm::ActiveValue::{NotSet, Set};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder};
use tracing::info;

use super::SeaOrmStorage;
use super::converters::{
    advertisement_to_active_model, model_to_advertisement, model_to_assignment,
    model_to_campaign, model_to_placement,
};
use super::{AdFilter, retry};
use crate::errors::{AdServeError, Result};
use crate::storage::models::{
    Advertisement, AdStatus, Campaign, Placement, PlacementAssignment,
};
use migration::entities::{advertisement, campaign, placement, placement_assignment};

impl SeaOrmStorage {
    // ============ 版位 ============

    /// 新建版位，返回带 id 的记录
    pub async fn insert_placement(&self, p: &Placement) -> Result<Placement> {
        let model = placement::ActiveModel {
            id: NotSet,
            name: Set(p.name.clone()),
            location: Set(p.location.clone()),
            dimensions: Set(p.dimensions.clone()),
            max_creative_size_kb: Set(p.max_creative_size_kb),
            price_per_impression: Set(p.price_per_impression),
            price_per_click: Set(p.price_per_click),
            is_active: Set(p.is_active),
            created_at: Set(p.created_at),
        };

        let result = placement::Entity::insert(model)
            .exec(self.get_db())
            .await
            .map_err(|e| {
                AdServeError::database_operation(format!("插入版位 '{}' 失败: {}", p.name, e))
            })?;

        let mut created = p.clone();
        created.id = result.last_insert_id;
        info!("Placement created: {} (id {})", created.name, created.id);
        Ok(created)
    }

    pub async fn get_placement(&self, id: i64) -> Result<Option<Placement>> {
        let model = placement::Entity::find_by_id(id).one(self.get_db()).await?;
        Ok(model.map(model_to_placement))
    }

    pub async fn get_placement_by_name(&self, name: &str) -> Result<Option<Placement>> {
        let model = placement::Entity::find()
            .filter(placement::Column::Name.eq(name))
            .one(self.get_db())
            .await?;
        Ok(model.map(model_to_placement))
    }

    pub async fn list_placements(&self) -> Result<Vec<Placement>> {
        let models = placement::Entity::find()
            .order_by_asc(placement::Column::Location)
            .order_by_asc(placement::Column::Name)
            .all(self.get_db())
            .await?;
        Ok(models.into_iter().map(model_to_placement).collect())
    }

    /// 更新版位的可变字段（定价与启用状态）
    pub async fn update_placement(&self, p: &Placement) -> Result<()> {
        let model = placement::ActiveModel {
            id: Set(p.id),
            name: NotSet,
            location: NotSet,
            dimensions: NotSet,
            max_creative_size_kb: NotSet,
            price_per_impression: Set(p.price_per_impression),
            price_per_click: Set(p.price_per_click),
            is_active: Set(p.is_active),
            created_at: NotSet,
        };
        model.update(self.get_db()).await?;
        Ok(())
    }

    // ============ 广告 ============

    pub async fn insert_advertisement(&self, ad: &Advertisement) -> Result<()> {
        let model = advertisement_to_active_model(ad, true)?;
        advertisement::Entity::insert(model)
            .exec(self.get_db())
            .await
            .map_err(|e| {
                AdServeError::database_operation(format!("插入广告 '{}' 失败: {}", ad.id, e))
            })?;
        info!("Advertisement created: {} ({})", ad.title, ad.id);
        Ok(())
    }

    pub async fn get_advertisement(&self, id: &str) -> Result<Option<Advertisement>> {
        let model = advertisement::Entity::find_by_id(id)
            .one(self.get_db())
            .await?;
        model.map(model_to_advertisement).transpose()
    }

    /// 更新广告的非计数器字段
    ///
    /// 计数器只由事件写入路径修改（见 events.rs）。
    pub async fn update_advertisement(&self, ad: &Advertisement) -> Result<()> {
        let model = advertisement_to_active_model(ad, false)?;
        let db = self.get_db();
        retry::with_retry("update_advertisement", self.retry_config(), || async {
            model.clone().update(db).await
        })
        .await?;
        Ok(())
    }

    /// 删除广告并级联删除其版位关联
    pub async fn delete_advertisement(&self, id: &str) -> Result<bool> {
        placement_assignment::Entity::delete_many()
            .filter(placement_assignment::Column::AdvertisementId.eq(id))
            .exec(self.get_db())
            .await?;

        let result = advertisement::Entity::delete_by_id(id)
            .exec(self.get_db())
            .await?;
        Ok(result.rows_affected > 0)
    }

    pub async fn list_advertisements(&self, filter: &AdFilter) -> Result<Vec<Advertisement>> {
        let mut query = advertisement::Entity::find();

        if let Some(ref advertiser) = filter.advertiser_id {
            query = query.filter(advertisement::Column::AdvertiserId.eq(advertiser));
        }
        if let Some(status) = filter.status {
            query = query.filter(advertisement::Column::Status.eq(status.to_string()));
        }
        if let Some(ref campaign_id) = filter.campaign_id {
            query = query.filter(advertisement::Column::CampaignId.eq(campaign_id));
        }
        if filter.only_serving {
            let now = Utc::now();
            query = query
                .filter(advertisement::Column::Status.eq(AdStatus::Active.to_string()))
                .filter(advertisement::Column::ScheduleStart.lte(now))
                .filter(advertisement::Column::ScheduleEnd.gte(now));
        }

        let models = query
            .order_by_desc(advertisement::Column::CreatedAt)
            .all(self.get_db())
            .await?;
        models.into_iter().map(model_to_advertisement).collect()
    }

    /// 批量拉取广告（评估器用，保持单次查询）
    pub async fn get_advertisements_by_ids(&self, ids: &[String]) -> Result<Vec<Advertisement>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let models = advertisement::Entity::find()
            .filter(advertisement::Column::Id.is_in(ids.iter().map(|s| s.as_str())))
            .all(self.get_db())
            .await?;
        models.into_iter().map(model_to_advertisement).collect()
    }

    // ============ 版位关联 ============

    pub async fn insert_assignment(
        &self,
        advertisement_id: &str,
        placement_id: i64,
        priority: i32,
        max_impressions: Option<i64>,
    ) -> Result<PlacementAssignment> {
        let now = Utc::now();
        let model = placement_assignment::ActiveModel {
            id: NotSet,
            advertisement_id: Set(advertisement_id.to_string()),
            placement_id: Set(placement_id),
            priority: Set(priority),
            max_impressions: Set(max_impressions),
            assigned_at: Set(now),
        };

        let result = placement_assignment::Entity::insert(model)
            .exec(self.get_db())
            .await
            .map_err(|e| {
                // 唯一索引 (advertisement_id, placement_id) 冲突走 Validation
                let msg = e.to_string();
                if msg.to_lowercase().contains("unique") {
                    AdServeError::validation(format!(
                        "广告 {} 已关联到版位 {}",
                        advertisement_id, placement_id
                    ))
                } else {
                    AdServeError::database_operation(msg)
                }
            })?;

        Ok(PlacementAssignment {
            id: result.last_insert_id,
            advertisement_id: advertisement_id.to_string(),
            placement_id,
            priority,
            max_impressions,
            assigned_at: now,
        })
    }

    pub async fn delete_assignment(
        &self,
        advertisement_id: &str,
        placement_id: i64,
    ) -> Result<bool> {
        let result = placement_assignment::Entity::delete_many()
            .filter(placement_assignment::Column::AdvertisementId.eq(advertisement_id))
            .filter(placement_assignment::Column::PlacementId.eq(placement_id))
            .exec(self.get_db())
            .await?;
        Ok(result.rows_affected > 0)
    }

    /// 某版位的全部关联，按优先级升序（1 = 最高）
    pub async fn assignments_for_placement(
        &self,
        placement_id: i64,
    ) -> Result<Vec<PlacementAssignment>> {
        let models = placement_assignment::Entity::find()
            .filter(placement_assignment::Column::PlacementId.eq(placement_id))
            .order_by_asc(placement_assignment::Column::Priority)
            .all(self.get_db())
            .await?;
        Ok(models.into_iter().map(model_to_assignment).collect())
    }

    pub async fn assignments_for_advertisement(
        &self,
        advertisement_id: &str,
    ) -> Result<Vec<PlacementAssignment>> {
        let models = placement_assignment::Entity::find()
            .filter(placement_assignment::Column::AdvertisementId.eq(advertisement_id))
            .order_by_asc(placement_assignment::Column::Priority)
            .all(self.get_db())
            .await?;
        Ok(models.into_iter().map(model_to_assignment).collect())
    }

    // ============ 广告系列 ============

    pub async fn insert_campaign(&self, c: &Campaign) -> Result<()> {
        let model = campaign::ActiveModel {
            id: Set(c.id.clone()),
            name: Set(c.name.clone()),
            description: Set(c.description.clone()),
            campaign_type: Set(c.campaign_type.clone()),
            manager_id: Set(c.manager_id.clone()),
            total_budget: Set(c.total_budget),
            schedule_start: Set(c.schedule_start),
            schedule_end: Set(c.schedule_end),
            target_impressions: Set(c.target_impressions),
            target_clicks: Set(c.target_clicks),
            target_conversions: Set(c.target_conversions),
            target_ctr: Set(c.target_ctr),
            is_active: Set(c.is_active),
            created_at: Set(c.created_at),
            updated_at: Set(c.updated_at),
        };
        campaign::Entity::insert(model).exec(self.get_db()).await?;
        info!("Campaign created: {} ({})", c.name, c.id);
        Ok(())
    }

    pub async fn get_campaign(&self, id: &str) -> Result<Option<Campaign>> {
        let model = campaign::Entity::find_by_id(id).one(self.get_db()).await?;
        Ok(model.map(model_to_campaign))
    }

    pub async fn list_campaigns(&self, manager_id: Option<&str>) -> Result<Vec<Campaign>> {
        let mut query = campaign::Entity::find();
        if let Some(manager) = manager_id {
            query = query.filter(campaign::Column::ManagerId.eq(manager));
        }
        let models = query
            .order_by_desc(campaign::Column::CreatedAt)
            .all(self.get_db())
            .await?;
        Ok(models.into_iter().map(model_to_campaign).collect())
    }
}
