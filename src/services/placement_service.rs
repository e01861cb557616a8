//! 版位目录维护与广告-版位关联

use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use crate::errors::{AdServeError, Result};
use crate::storage::models::{Placement, PlacementAssignment};
use crate::storage::SeaOrmStorage;

#[derive(Debug, Clone)]
pub struct CreatePlacementRequest {
    pub name: String,
    pub location: String,
    pub dimensions: Option<String>,
    pub max_creative_size_kb: i32,
    /// micros
    pub price_per_impression: i64,
    /// micros
    pub price_per_click: i64,
}

pub struct PlacementService {
    storage: Arc<SeaOrmStorage>,
}

impl PlacementService {
    pub fn new(storage: Arc<SeaOrmStorage>) -> Self {
        Self { storage }
    }

    /// 新建版位，名称全局唯一
    pub async fn create(&self, req: CreatePlacementRequest) -> Result<Placement> {
        if req.name.trim().is_empty() {
            return Err(AdServeError::validation("Placement name is required"));
        }
        if req.price_per_impression < 0 || req.price_per_click < 0 {
            return Err(AdServeError::validation(
                "Placement prices cannot be negative",
            ));
        }
        if self
            .storage
            .get_placement_by_name(req.name.trim())
            .await?
            .is_some()
        {
            return Err(AdServeError::validation(format!(
                "Placement name already in use: '{}'",
                req.name.trim()
            )));
        }

        let placement = Placement {
            id: 0,
            name: req.name.trim().to_string(),
            location: req.location,
            dimensions: req.dimensions,
            max_creative_size_kb: req.max_creative_size_kb,
            price_per_impression: req.price_per_impression,
            price_per_click: req.price_per_click,
            is_active: true,
            created_at: Utc::now(),
        };
        self.storage.insert_placement(&placement).await
    }

    pub async fn get(&self, id: i64) -> Result<Placement> {
        self.storage
            .get_placement(id)
            .await?
            .ok_or_else(|| AdServeError::not_found(format!("Placement not found: {}", id)))
    }

    pub async fn list(&self) -> Result<Vec<Placement>> {
        self.storage.list_placements().await
    }

    /// 调整定价，只影响之后记录的事件，已记录事件的 cost 不回溯
    pub async fn update_pricing(
        &self,
        id: i64,
        price_per_impression: i64,
        price_per_click: i64,
    ) -> Result<Placement> {
        if price_per_impression < 0 || price_per_click < 0 {
            return Err(AdServeError::validation(
                "Placement prices cannot be negative",
            ));
        }
        let mut placement = self.get(id).await?;
        placement.price_per_impression = price_per_impression;
        placement.price_per_click = price_per_click;
        self.storage.update_placement(&placement).await?;
        Ok(placement)
    }

    /// 启用/停用版位，停用后评估器对该版位返回空
    pub async fn set_active(&self, id: i64, active: bool) -> Result<Placement> {
        let mut placement = self.get(id).await?;
        placement.is_active = active;
        self.storage.update_placement(&placement).await?;
        info!(
            "Placement {} ({}) set to {}",
            placement.name,
            placement.id,
            if active { "active" } else { "inactive" }
        );
        Ok(placement)
    }

    /// 把广告关联到版位
    ///
    /// 同一 (广告, 版位) 组合只允许一条关联，优先级从 1 起（1 最高）。
    pub async fn assign(
        &self,
        advertisement_id: &str,
        placement_id: i64,
        priority: i32,
        max_impressions: Option<i64>,
    ) -> Result<PlacementAssignment> {
        if priority < 1 {
            return Err(AdServeError::validation("Priority must be at least 1"));
        }
        if let Some(cap) = max_impressions {
            if cap <= 0 {
                return Err(AdServeError::validation(
                    "Impression cap must be positive when set",
                ));
            }
        }
        if self
            .storage
            .get_advertisement(advertisement_id)
            .await?
            .is_none()
        {
            return Err(AdServeError::not_found(format!(
                "Advertisement not found: {}",
                advertisement_id
            )));
        }
        // 校验版位存在
        self.get(placement_id).await?;

        self.storage
            .insert_assignment(advertisement_id, placement_id, priority, max_impressions)
            .await
    }

    pub async fn detach(&self, advertisement_id: &str, placement_id: i64) -> Result<()> {
        let removed = self
            .storage
            .delete_assignment(advertisement_id, placement_id)
            .await?;
        if !removed {
            return Err(AdServeError::not_found(format!(
                "Assignment not found: advertisement {} on placement {}",
                advertisement_id, placement_id
            )));
        }
        Ok(())
    }

    pub async fn assignments(&self, placement_id: i64) -> Result<Vec<PlacementAssignment>> {
        self.storage.assignments_for_placement(placement_id).await
    }
}
