//! 投放事件表迁移
//!
//! 创建 delivery_events 表（只追加日志），包括：
//! - 事件类型与发生时间
//! - 记录时刻固定的成本归因
//! - 会话/用户引用（可空，匿名事件）
//! - orphaned 标记（审计保留但不计入计数器）

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(DeliveryEvents::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(DeliveryEvents::Id)
                            .string_len(36)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(DeliveryEvents::AdvertisementId)
                            .string_len(36)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(DeliveryEvents::PlacementId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(DeliveryEvents::EventType)
                            .string_len(20)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(DeliveryEvents::OccurredAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(DeliveryEvents::Cost)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(DeliveryEvents::SessionId).string_len(100).null())
                    .col(ColumnDef::new(DeliveryEvents::UserRef).string_len(64).null())
                    .col(
                        ColumnDef::new(DeliveryEvents::Orphaned)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(DeliveryEvents::Metadata).text().null())
                    .to_owned(),
            )
            .await?;

        // 单广告时间序列查询索引（聚合窗口扫描）
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_events_ad_time")
                    .table(DeliveryEvents::Table)
                    .col(DeliveryEvents::AdvertisementId)
                    .col(DeliveryEvents::OccurredAt)
                    .to_owned(),
            )
            .await?;

        // 版位 + 事件类型索引（曝光上限计数）
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_events_placement_type")
                    .table(DeliveryEvents::Table)
                    .col(DeliveryEvents::PlacementId)
                    .col(DeliveryEvents::EventType)
                    .to_owned(),
            )
            .await?;

        // 时间索引（按日期保留/归档）
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_events_occurred_at")
                    .table(DeliveryEvents::Table)
                    .col(DeliveryEvents::OccurredAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(DeliveryEvents::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum DeliveryEvents {
    Table,
    Id,
    AdvertisementId,
    PlacementId,
    EventType,
    OccurredAt,
    Cost,
    SessionId,
    UserRef,
    Orphaned,
    Metadata,
}
