//! 命令行入口
//!
//! serve       周期性天级汇总 + 留存清理的常驻进程
//! rollup      手工触发某天（或某广告某天）的汇总重算
//! sample-config  输出示例配置

use chrono::{Duration, Utc};
use clap::{Parser, Subcommand};
use tokio::time::interval;
use tracing::{error, info};

use crate::config::{get_config, StaticConfig};
use crate::errors::Result;
use crate::services::AnalyticsService;
use crate::storage::StorageFactory;

#[derive(Parser)]
#[command(name = "adserve", version, about = "Advertisement delivery and analytics engine")]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the periodic rollup scheduler in the foreground
    Serve,
    /// Recompute daily rollups once and exit
    Rollup {
        /// Day to aggregate (YYYY-MM-DD), defaults to yesterday (UTC)
        #[arg(long)]
        date: Option<String>,
        /// Restrict the rollup to a single advertisement
        #[arg(long)]
        advertisement: Option<String>,
    },
    /// Print a sample TOML configuration to stdout
    SampleConfig,
}

pub async fn run() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Command::Serve => serve().await,
        Command::Rollup {
            date,
            advertisement,
        } => rollup(date.as_deref(), advertisement.as_deref()).await,
        Command::SampleConfig => {
            println!("{}", StaticConfig::generate_sample_config());
            Ok(())
        }
    }
}

/// 常驻调度循环：每个周期汇总昨天与今天的窗口，然后做留存清理
///
/// 昨天的窗口每轮都重算一次，跨日边界附近迟到的事件最终会被
/// 收进正确的桶里（整窗覆盖写，重复计算无副作用）。
async fn serve() -> Result<()> {
    let storage = StorageFactory::create().await?;
    info!("Using storage backend: {}", storage.backend_name());

    let analytics = AnalyticsService::new(storage);
    let cfg = get_config();
    let mut ticker = interval(std::time::Duration::from_secs(
        cfg.analytics.rollup_interval_secs.max(60),
    ));

    info!(
        "Rollup scheduler started (interval {}s)",
        cfg.analytics.rollup_interval_secs
    );

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let today = Utc::now().date_naive();
                let yesterday = today - Duration::days(1);

                for day in [yesterday, today] {
                    if let Err(e) = analytics.aggregate_day_for_all(day).await {
                        error!("Rollup failed for {}: {}", day, e);
                    }
                }

                if let Err(e) = analytics
                    .cleanup_expired(
                        cfg.analytics.event_retention_days,
                        cfg.analytics.stats_retention_days,
                    )
                    .await
                {
                    error!("Retention cleanup failed: {}", e);
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Shutdown signal received, stopping scheduler");
                return Ok(());
            }
        }
    }
}

async fn rollup(date: Option<&str>, advertisement: Option<&str>) -> Result<()> {
    let day = match date {
        Some(s) => AnalyticsService::parse_date(s)?,
        None => Utc::now().date_naive() - Duration::days(1),
    };

    let storage = StorageFactory::create().await?;
    let analytics = AnalyticsService::new(storage);

    match advertisement {
        Some(ad_id) => {
            let stats = analytics.aggregate(ad_id, day).await?;
            info!(
                "Rollup complete: {} @ {} ({} impressions, {} clicks, {} conversions)",
                ad_id, day, stats.impressions, stats.clicks, stats.conversions
            );
        }
        None => {
            let processed = analytics.aggregate_day_for_all(day).await?;
            info!("Rollup complete: {} advertisements @ {}", processed, day);
        }
    }
    Ok(())
}
