//! Service layer
//!
//! Business logic shared by every interface (CLI, scheduler, embedding
//! callers). Each service owns no state beyond an `Arc<SeaOrmStorage>`.

pub mod ad_service;
pub mod analytics_service;
pub mod campaign_service;
pub mod eligibility;
pub mod event_service;
pub mod insights;
pub mod placement_service;

pub use ad_service::{AdService, BatchAction, BatchItemResult, Caller, CreateAdRequest, UpdateAdRequest};
pub use analytics_service::AnalyticsService;
pub use campaign_service::{CampaignPerformance, CampaignService, CreateCampaignRequest, GoalProgress};
pub use eligibility::{EligibilityService, EligibleAd};
pub use event_service::{compute_event_cost, EventService, RecordEventRequest, RecordedEvent};
pub use insights::{
    AdPerformance, InsightsService, OverviewStats, PerformanceSnapshot, RecommendationStrategy,
    ThresholdRules, TopAd,
};
pub use placement_service::{CreatePlacementRequest, PlacementService};
