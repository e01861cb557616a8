//! 天级统计汇总表迁移
//!
//! ad_stats_daily 为派生表：按 (advertisement_id, day_bucket) 唯一，
//! 可整表删除后从 delivery_events 重建。

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(AdStatsDaily::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AdStatsDaily::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(AdStatsDaily::AdvertisementId)
                            .string_len(36)
                            .not_null(),
                    )
                    .col(ColumnDef::new(AdStatsDaily::DayBucket).date().not_null())
                    .col(
                        ColumnDef::new(AdStatsDaily::Impressions)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(AdStatsDaily::Clicks)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(AdStatsDaily::Conversions)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(AdStatsDaily::AmountSpent)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(AdStatsDaily::Ctr).double().not_null().default(0.0))
                    .col(ColumnDef::new(AdStatsDaily::Cpc).double().not_null().default(0.0))
                    .col(ColumnDef::new(AdStatsDaily::Cpa).double().not_null().default(0.0))
                    .col(ColumnDef::new(AdStatsDaily::DeviceBreakdown).text().null())
                    .col(ColumnDef::new(AdStatsDaily::GeoBreakdown).text().null())
                    .col(
                        ColumnDef::new(AdStatsDaily::ComputedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // 幂等 upsert 键
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_stats_ad_day")
                    .table(AdStatsDaily::Table)
                    .col(AdStatsDaily::AdvertisementId)
                    .col(AdStatsDaily::DayBucket)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // 日期范围查询索引
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_stats_day")
                    .table(AdStatsDaily::Table)
                    .col(AdStatsDaily::DayBucket)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(AdStatsDaily::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum AdStatsDaily {
    Table,
    Id,
    AdvertisementId,
    DayBucket,
    Impressions,
    Clicks,
    Conversions,
    AmountSpent,
    Ctr,
    Cpc,
    Cpa,
    DeviceBreakdown,
    GeoBreakdown,
    ComputedAt,
}
