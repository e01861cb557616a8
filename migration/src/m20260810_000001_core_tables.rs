//! 核心表迁移
//!
//! 创建投放引擎的基础表：
//! - placements: 广告版位定义（位置、尺寸、定价）
//! - advertisements: 广告主体（排期、预算、计数器）
//! - placement_assignments: 广告与版位的关联（优先级、曝光上限）
//! - campaigns: 广告系列（目标与预算，不存计数器）

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // 创建 placements 表
        manager
            .create_table(
                Table::create()
                    .table(Placements::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Placements::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Placements::Name)
                            .string_len(100)
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(Placements::Location).string_len(50).not_null())
                    .col(ColumnDef::new(Placements::Dimensions).string_len(20).null())
                    .col(
                        ColumnDef::new(Placements::MaxCreativeSizeKb)
                            .integer()
                            .not_null()
                            .default(5120),
                    )
                    .col(
                        ColumnDef::new(Placements::PricePerImpression)
                            .big_integer()
                            .not_null()
                            .default(1000),
                    )
                    .col(
                        ColumnDef::new(Placements::PricePerClick)
                            .big_integer()
                            .not_null()
                            .default(50000),
                    )
                    .col(
                        ColumnDef::new(Placements::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Placements::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // 创建 advertisements 表
        manager
            .create_table(
                Table::create()
                    .table(Advertisements::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Advertisements::Id)
                            .string_len(36)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Advertisements::AdvertiserId)
                            .string_len(64)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Advertisements::Title).string_len(200).not_null())
                    .col(ColumnDef::new(Advertisements::Description).text().not_null())
                    .col(ColumnDef::new(Advertisements::AdType).string_len(30).not_null())
                    .col(ColumnDef::new(Advertisements::CampaignId).string_len(36).null())
                    .col(ColumnDef::new(Advertisements::Targeting).text().not_null())
                    .col(
                        ColumnDef::new(Advertisements::BannerImageUrl)
                            .string_len(500)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Advertisements::LandingPageUrl)
                            .string_len(500)
                            .null(),
                    )
                    .col(ColumnDef::new(Advertisements::VideoUrl).string_len(500).null())
                    .col(
                        ColumnDef::new(Advertisements::CallToAction)
                            .string_len(50)
                            .not_null()
                            .default("Learn More"),
                    )
                    .col(ColumnDef::new(Advertisements::Budget).big_integer().not_null())
                    .col(ColumnDef::new(Advertisements::DailyBudget).big_integer().null())
                    .col(
                        ColumnDef::new(Advertisements::BidAmount)
                            .big_integer()
                            .not_null()
                            .default(50000),
                    )
                    .col(
                        ColumnDef::new(Advertisements::PricingModel)
                            .string_len(20)
                            .not_null()
                            .default("cpc"),
                    )
                    .col(
                        ColumnDef::new(Advertisements::Currency)
                            .string_len(3)
                            .not_null()
                            .default("GHS"),
                    )
                    .col(
                        ColumnDef::new(Advertisements::ScheduleStart)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Advertisements::ScheduleEnd)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Advertisements::Status)
                            .string_len(20)
                            .not_null()
                            .default("draft"),
                    )
                    .col(ColumnDef::new(Advertisements::RejectionReason).text().null())
                    .col(ColumnDef::new(Advertisements::ApprovedBy).string_len(64).null())
                    .col(
                        ColumnDef::new(Advertisements::ApprovedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Advertisements::Impressions)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Advertisements::Clicks)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Advertisements::Conversions)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Advertisements::AmountSpent)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Advertisements::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Advertisements::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // 广告主 + 状态 查询索引
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_ads_advertiser_status")
                    .table(Advertisements::Table)
                    .col(Advertisements::AdvertiserId)
                    .col(Advertisements::Status)
                    .to_owned(),
            )
            .await?;

        // 排期窗口索引
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_ads_schedule")
                    .table(Advertisements::Table)
                    .col(Advertisements::ScheduleStart)
                    .col(Advertisements::ScheduleEnd)
                    .to_owned(),
            )
            .await?;

        // 广告系列成员索引
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_ads_campaign")
                    .table(Advertisements::Table)
                    .col(Advertisements::CampaignId)
                    .to_owned(),
            )
            .await?;

        // 创建 placement_assignments 表
        manager
            .create_table(
                Table::create()
                    .table(PlacementAssignments::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PlacementAssignments::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(PlacementAssignments::AdvertisementId)
                            .string_len(36)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PlacementAssignments::PlacementId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PlacementAssignments::Priority)
                            .integer()
                            .not_null()
                            .default(1),
                    )
                    .col(
                        ColumnDef::new(PlacementAssignments::MaxImpressions)
                            .big_integer()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(PlacementAssignments::AssignedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // 同一广告在同一版位只能有一条关联
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_assignments_ad_placement")
                    .table(PlacementAssignments::Table)
                    .col(PlacementAssignments::AdvertisementId)
                    .col(PlacementAssignments::PlacementId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // 版位评估索引（按优先级取候选）
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_assignments_placement_priority")
                    .table(PlacementAssignments::Table)
                    .col(PlacementAssignments::PlacementId)
                    .col(PlacementAssignments::Priority)
                    .to_owned(),
            )
            .await?;

        // 创建 campaigns 表
        manager
            .create_table(
                Table::create()
                    .table(Campaigns::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Campaigns::Id)
                            .string_len(36)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Campaigns::Name).string_len(200).not_null())
                    .col(ColumnDef::new(Campaigns::Description).text().not_null())
                    .col(ColumnDef::new(Campaigns::CampaignType).string_len(30).not_null())
                    .col(ColumnDef::new(Campaigns::ManagerId).string_len(64).not_null())
                    .col(ColumnDef::new(Campaigns::TotalBudget).big_integer().not_null())
                    .col(
                        ColumnDef::new(Campaigns::ScheduleStart)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Campaigns::ScheduleEnd)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Campaigns::TargetImpressions).big_integer().null())
                    .col(ColumnDef::new(Campaigns::TargetClicks).big_integer().null())
                    .col(ColumnDef::new(Campaigns::TargetConversions).big_integer().null())
                    .col(ColumnDef::new(Campaigns::TargetCtr).double().null())
                    .col(
                        ColumnDef::new(Campaigns::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Campaigns::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Campaigns::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(PlacementAssignments::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Campaigns::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Advertisements::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Placements::Table).to_owned())
            .await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Placements {
    Table,
    Id,
    Name,
    Location,
    Dimensions,
    MaxCreativeSizeKb,
    PricePerImpression,
    PricePerClick,
    IsActive,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Advertisements {
    Table,
    Id,
    AdvertiserId,
    Title,
    Description,
    AdType,
    CampaignId,
    Targeting,
    BannerImageUrl,
    LandingPageUrl,
    VideoUrl,
    CallToAction,
    Budget,
    DailyBudget,
    BidAmount,
    PricingModel,
    Currency,
    ScheduleStart,
    ScheduleEnd,
    Status,
    RejectionReason,
    ApprovedBy,
    ApprovedAt,
    Impressions,
    Clicks,
    Conversions,
    AmountSpent,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum PlacementAssignments {
    Table,
    Id,
    AdvertisementId,
    PlacementId,
    Priority,
    MaxImpressions,
    AssignedAt,
}

#[derive(DeriveIden)]
enum Campaigns {
    Table,
    Id,
    Name,
    Description,
    CampaignType,
    ManagerId,
    TotalBudget,
    ScheduleStart,
    ScheduleEnd,
    TargetImpressions,
    TargetClicks,
    TargetConversions,
    TargetCtr,
    IsActive,
    CreatedAt,
    UpdatedAt,
}
