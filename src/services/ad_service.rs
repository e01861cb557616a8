//! 广告生命周期服务
//!
//! 状态机：
//! draft -> pending_approval -> active -> paused/completed
//!                           -> rejected -> (编辑后) draft
//! 所有状态转换集中在这里做守卫，存储层不做状态校验。

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::{AdServeError, Result};
use crate::storage::models::{
    AdStatus, AdType, Advertisement, PricingModel, TargetingCriteria,
};
use crate::storage::{AdFilter, SeaOrmStorage};

/// 操作发起者，用于归属校验
#[derive(Debug, Clone)]
pub struct Caller {
    pub id: String,
    /// 运营/审核角色，可越过归属校验
    pub is_staff: bool,
}

impl Caller {
    pub fn advertiser(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            is_staff: false,
        }
    }

    pub fn staff(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            is_staff: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CreateAdRequest {
    pub title: String,
    pub description: String,
    pub ad_type: AdType,
    pub campaign_id: Option<String>,
    pub targeting: TargetingCriteria,
    pub banner_image_url: String,
    pub landing_page_url: Option<String>,
    pub video_url: Option<String>,
    pub call_to_action: Option<String>,
    /// micros
    pub budget: i64,
    /// micros
    pub daily_budget: Option<i64>,
    /// micros
    pub bid_amount: i64,
    pub pricing_model: PricingModel,
    pub currency: Option<String>,
    pub schedule_start: DateTime<Utc>,
    pub schedule_end: DateTime<Utc>,
}

/// 可编辑字段的部分更新；None 表示保持不变
#[derive(Debug, Clone, Default)]
pub struct UpdateAdRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub targeting: Option<TargetingCriteria>,
    pub banner_image_url: Option<String>,
    pub landing_page_url: Option<Option<String>>,
    pub video_url: Option<Option<String>>,
    pub call_to_action: Option<String>,
    pub budget: Option<i64>,
    pub daily_budget: Option<Option<i64>>,
    pub bid_amount: Option<i64>,
    pub schedule_start: Option<DateTime<Utc>>,
    pub schedule_end: Option<DateTime<Utc>>,
}

/// 批量操作动作
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchAction {
    Approve,
    Pause,
    Resume,
}

/// 批量操作的单条结果，失败不影响其余条目
#[derive(Debug)]
pub struct BatchItemResult {
    pub advertisement_id: String,
    pub outcome: Result<AdStatus>,
}

pub struct AdService {
    storage: Arc<SeaOrmStorage>,
}

impl AdService {
    pub fn new(storage: Arc<SeaOrmStorage>) -> Self {
        Self { storage }
    }

    /// 创建广告，初始状态恒为 draft
    pub async fn create(&self, caller: &Caller, req: CreateAdRequest) -> Result<Advertisement> {
        let now = Utc::now();
        validate_schedule_and_budget(
            req.budget,
            req.daily_budget,
            req.schedule_start,
            req.schedule_end,
            now,
        )?;
        if req.banner_image_url.trim().is_empty() {
            return Err(AdServeError::validation("Banner image is required"));
        }
        if req.bid_amount < 0 {
            return Err(AdServeError::validation("Bid amount cannot be negative"));
        }
        if let Some(ref campaign_id) = req.campaign_id {
            if self.storage.get_campaign(campaign_id).await?.is_none() {
                return Err(AdServeError::not_found(format!(
                    "Campaign not found: {}",
                    campaign_id
                )));
            }
        }

        let ad = Advertisement {
            id: Uuid::new_v4().to_string(),
            advertiser_id: caller.id.clone(),
            title: req.title,
            description: req.description,
            ad_type: req.ad_type,
            campaign_id: req.campaign_id,
            targeting: req.targeting,
            banner_image_url: req.banner_image_url,
            landing_page_url: req.landing_page_url,
            video_url: req.video_url,
            call_to_action: req.call_to_action.unwrap_or_else(|| "Learn More".to_string()),
            budget: req.budget,
            daily_budget: req.daily_budget,
            bid_amount: req.bid_amount,
            pricing_model: req.pricing_model,
            currency: req.currency.unwrap_or_else(|| "GHS".to_string()),
            schedule_start: req.schedule_start,
            schedule_end: req.schedule_end,
            status: AdStatus::Draft,
            rejection_reason: None,
            approved_by: None,
            approved_at: None,
            impressions: 0,
            clicks: 0,
            conversions: 0,
            amount_spent: 0,
            created_at: now,
            updated_at: now,
        };

        self.storage.insert_advertisement(&ad).await?;
        Ok(ad)
    }

    /// 编辑广告
    ///
    /// 只允许在 draft / rejected 状态下编辑；rejected 编辑后回到 draft
    /// 并清除拒绝原因，需要重新送审。
    pub async fn update(
        &self,
        caller: &Caller,
        id: &str,
        req: UpdateAdRequest,
    ) -> Result<Advertisement> {
        let mut ad = self.get_owned(caller, id).await?;
        if !matches!(ad.status, AdStatus::Draft | AdStatus::Rejected) {
            return Err(AdServeError::invalid_state(format!(
                "Cannot edit advertisement in status '{}'",
                ad.status
            )));
        }

        let was_rejected = ad.status == AdStatus::Rejected;

        if let Some(title) = req.title {
            ad.title = title;
        }
        if let Some(description) = req.description {
            ad.description = description;
        }
        if let Some(targeting) = req.targeting {
            ad.targeting = targeting;
        }
        if let Some(banner) = req.banner_image_url {
            ad.banner_image_url = banner;
        }
        if let Some(landing) = req.landing_page_url {
            ad.landing_page_url = landing;
        }
        if let Some(video) = req.video_url {
            ad.video_url = video;
        }
        if let Some(cta) = req.call_to_action {
            ad.call_to_action = cta;
        }
        if let Some(budget) = req.budget {
            ad.budget = budget;
        }
        if let Some(daily) = req.daily_budget {
            ad.daily_budget = daily;
        }
        if let Some(bid) = req.bid_amount {
            ad.bid_amount = bid;
        }
        if let Some(start) = req.schedule_start {
            ad.schedule_start = start;
        }
        if let Some(end) = req.schedule_end {
            ad.schedule_end = end;
        }

        // 编辑后的整体仍要满足创建时的约束（排期起点校验仅在被修改时生效）
        if ad.budget <= 0 {
            return Err(AdServeError::validation("Budget must be greater than 0"));
        }
        if let Some(daily) = ad.daily_budget {
            if daily <= 0 || daily > ad.budget {
                return Err(AdServeError::validation(
                    "Daily budget must be positive and cannot exceed total budget",
                ));
            }
        }
        if ad.schedule_start >= ad.schedule_end {
            return Err(AdServeError::validation("End date must be after start date"));
        }
        if req.schedule_start.is_some() && ad.schedule_start < Utc::now() {
            return Err(AdServeError::validation("Start date cannot be in the past"));
        }
        if ad.banner_image_url.trim().is_empty() {
            return Err(AdServeError::validation("Banner image is required"));
        }

        if was_rejected {
            ad.status = AdStatus::Draft;
            ad.rejection_reason = None;
        }
        ad.updated_at = Utc::now();
        self.storage.update_advertisement(&ad).await?;
        Ok(ad)
    }

    /// draft -> pending_approval
    pub async fn submit_for_approval(&self, caller: &Caller, id: &str) -> Result<Advertisement> {
        let mut ad = self.get_owned(caller, id).await?;
        if ad.status != AdStatus::Draft {
            return Err(AdServeError::invalid_state(format!(
                "Only draft advertisements can be submitted, current status is '{}'",
                ad.status
            )));
        }

        // 送审前再做一次完整性检查，草稿可能放了很久
        let now = Utc::now();
        if ad.budget <= 0 {
            return Err(AdServeError::validation("Budget must be greater than 0"));
        }
        if ad.schedule_start <= now {
            return Err(AdServeError::validation(
                "Schedule start has passed, adjust dates before submitting",
            ));
        }
        if ad.banner_image_url.trim().is_empty() {
            return Err(AdServeError::validation("Banner image is required"));
        }

        ad.status = AdStatus::PendingApproval;
        ad.updated_at = now;
        self.storage.update_advertisement(&ad).await?;
        info!("Advertisement submitted for approval: {}", ad.id);
        Ok(ad)
    }

    /// pending_approval -> active（仅审核角色）
    pub async fn approve(&self, caller: &Caller, id: &str) -> Result<Advertisement> {
        if !caller.is_staff {
            return Err(AdServeError::validation(
                "Only staff can approve advertisements",
            ));
        }
        let mut ad = self.get_existing(id).await?;
        if ad.status != AdStatus::PendingApproval {
            return Err(AdServeError::invalid_state(format!(
                "Only pending advertisements can be approved, current status is '{}'",
                ad.status
            )));
        }

        let now = Utc::now();
        ad.status = AdStatus::Active;
        ad.approved_by = Some(caller.id.clone());
        ad.approved_at = Some(now);
        ad.rejection_reason = None;
        ad.updated_at = now;
        self.storage.update_advertisement(&ad).await?;
        info!("Advertisement approved: {} by {}", ad.id, caller.id);
        Ok(ad)
    }

    /// pending_approval -> rejected（仅审核角色，必须给出原因）
    pub async fn reject(&self, caller: &Caller, id: &str, reason: &str) -> Result<Advertisement> {
        if !caller.is_staff {
            return Err(AdServeError::validation(
                "Only staff can reject advertisements",
            ));
        }
        if reason.trim().is_empty() {
            return Err(AdServeError::validation("Rejection reason is required"));
        }
        let mut ad = self.get_existing(id).await?;
        if ad.status != AdStatus::PendingApproval {
            return Err(AdServeError::invalid_state(format!(
                "Only pending advertisements can be rejected, current status is '{}'",
                ad.status
            )));
        }

        ad.status = AdStatus::Rejected;
        ad.rejection_reason = Some(reason.trim().to_string());
        ad.updated_at = Utc::now();
        self.storage.update_advertisement(&ad).await?;
        warn!("Advertisement rejected: {} ({})", ad.id, reason.trim());
        Ok(ad)
    }

    /// active -> paused
    pub async fn pause(&self, caller: &Caller, id: &str) -> Result<Advertisement> {
        let mut ad = self.get_owned(caller, id).await?;
        if ad.status != AdStatus::Active {
            return Err(AdServeError::invalid_state(format!(
                "Only active advertisements can be paused, current status is '{}'",
                ad.status
            )));
        }
        ad.status = AdStatus::Paused;
        ad.updated_at = Utc::now();
        self.storage.update_advertisement(&ad).await?;
        Ok(ad)
    }

    /// paused -> active，排期已结束的广告不允许恢复
    pub async fn resume(&self, caller: &Caller, id: &str) -> Result<Advertisement> {
        let mut ad = self.get_owned(caller, id).await?;
        if ad.status != AdStatus::Paused {
            return Err(AdServeError::invalid_state(format!(
                "Only paused advertisements can be resumed, current status is '{}'",
                ad.status
            )));
        }
        if ad.schedule_end < Utc::now() {
            return Err(AdServeError::invalid_state(
                "Cannot resume expired advertisement",
            ));
        }
        ad.status = AdStatus::Active;
        ad.updated_at = Utc::now();
        self.storage.update_advertisement(&ad).await?;
        Ok(ad)
    }

    /// 删除广告（级联删除版位关联，历史事件保留）
    pub async fn delete(&self, caller: &Caller, id: &str) -> Result<()> {
        let ad = self.get_owned(caller, id).await?;
        if ad.status == AdStatus::Active {
            return Err(AdServeError::invalid_state(
                "Active advertisements must be paused before deletion",
            ));
        }
        self.storage.delete_advertisement(id).await?;
        info!("Advertisement deleted: {}", id);
        Ok(())
    }

    pub async fn get(&self, caller: &Caller, id: &str) -> Result<Advertisement> {
        self.get_owned(caller, id).await
    }

    /// 广告主只能看到自己的广告，审核角色可看全部
    pub async fn list(
        &self,
        caller: &Caller,
        status: Option<AdStatus>,
        campaign_id: Option<String>,
    ) -> Result<Vec<Advertisement>> {
        let filter = AdFilter {
            advertiser_id: if caller.is_staff {
                None
            } else {
                Some(caller.id.clone())
            },
            status,
            campaign_id,
            only_serving: false,
        };
        self.storage.list_advertisements(&filter).await
    }

    /// 批量状态转换
    ///
    /// 逐条执行并收集结果，单条失败（状态不符、不存在）不会中断
    /// 其余条目，也不会回滚已成功的条目。
    pub async fn batch_transition(
        &self,
        caller: &Caller,
        ids: &[String],
        action: BatchAction,
    ) -> Vec<BatchItemResult> {
        let mut results = Vec::with_capacity(ids.len());
        for id in ids {
            let outcome = match action {
                BatchAction::Approve => self.approve(caller, id).await,
                BatchAction::Pause => self.pause(caller, id).await,
                BatchAction::Resume => self.resume(caller, id).await,
            };
            results.push(BatchItemResult {
                advertisement_id: id.clone(),
                outcome: outcome.map(|ad| ad.status),
            });
        }
        results
    }

    async fn get_existing(&self, id: &str) -> Result<Advertisement> {
        self.storage
            .get_advertisement(id)
            .await?
            .ok_or_else(|| AdServeError::not_found(format!("Advertisement not found: {}", id)))
    }

    async fn get_owned(&self, caller: &Caller, id: &str) -> Result<Advertisement> {
        let ad = self.get_existing(id).await?;
        if !caller.is_staff && ad.advertiser_id != caller.id {
            // 归属不符时按不存在处理，不泄露他人广告 id
            return Err(AdServeError::not_found(format!(
                "Advertisement not found: {}",
                id
            )));
        }
        Ok(ad)
    }
}

fn validate_schedule_and_budget(
    budget: i64,
    daily_budget: Option<i64>,
    schedule_start: DateTime<Utc>,
    schedule_end: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Result<()> {
    if budget <= 0 {
        return Err(AdServeError::validation("Budget must be greater than 0"));
    }
    if let Some(daily) = daily_budget {
        if daily <= 0 || daily > budget {
            return Err(AdServeError::validation(
                "Daily budget must be positive and cannot exceed total budget",
            ));
        }
    }
    if schedule_start >= schedule_end {
        return Err(AdServeError::validation("End date must be after start date"));
    }
    if schedule_start < now {
        return Err(AdServeError::validation("Start date cannot be in the past"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_validate_rejects_non_positive_budget() {
        let now = Utc::now();
        let err = validate_schedule_and_budget(
            0,
            None,
            now + Duration::hours(1),
            now + Duration::days(7),
            now,
        )
        .unwrap_err();
        assert!(matches!(err, AdServeError::Validation(_)));
    }

    #[test]
    fn test_validate_rejects_daily_budget_above_total() {
        let now = Utc::now();
        let err = validate_schedule_and_budget(
            100,
            Some(200),
            now + Duration::hours(1),
            now + Duration::days(7),
            now,
        )
        .unwrap_err();
        assert!(matches!(err, AdServeError::Validation(_)));
    }

    #[test]
    fn test_validate_rejects_inverted_schedule() {
        let now = Utc::now();
        let err = validate_schedule_and_budget(
            100,
            None,
            now + Duration::days(7),
            now + Duration::hours(1),
            now,
        )
        .unwrap_err();
        assert!(matches!(err, AdServeError::Validation(_)));
    }

    #[test]
    fn test_validate_rejects_start_in_past() {
        let now = Utc::now();
        let err = validate_schedule_and_budget(
            100,
            None,
            now - Duration::hours(1),
            now + Duration::days(7),
            now,
        )
        .unwrap_err();
        assert!(matches!(err, AdServeError::Validation(_)));
    }

    #[test]
    fn test_validate_accepts_well_formed_request() {
        let now = Utc::now();
        assert!(validate_schedule_and_budget(
            100,
            Some(10),
            now + Duration::hours(1),
            now + Duration::days(7),
            now,
        )
        .is_ok());
    }
}
