pub mod ad_stats_daily;
pub mod advertisement;
pub mod campaign;
pub mod delivery_event;
pub mod placement;
pub mod placement_assignment;
