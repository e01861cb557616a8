use serde::{Deserialize, Serialize};

/// 静态配置（从 TOML 加载，启动时使用）
///
/// 包含基础设施配置：
/// - database: 数据库连接配置
/// - analytics: 聚合任务与留存配置
/// - insights: 优化建议阈值
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StaticConfig {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub analytics: AnalyticsConfig,
    #[serde(default)]
    pub insights: InsightsConfig,
}

impl StaticConfig {
    /// 从 TOML 文件和环境变量加载配置
    ///
    /// 优先级：ENV > config.toml > 默认值
    /// ENV 前缀：ADS，分隔符：__
    /// 示例：ADS__DATABASE__DATABASE_URL=sqlite://ads.db
    pub fn load() -> Self {
        use config::{Config, Environment, File};

        let path = "config.toml";

        let builder = Config::builder()
            // 1. 从 TOML 文件加载（可选）
            .add_source(File::with_name(path).required(false))
            // 2. 从环境变量覆盖，前缀 ADS，分隔符 __
            .add_source(
                Environment::with_prefix("ADS")
                    .separator("__")
                    .try_parsing(true),
            );

        match builder.build() {
            Ok(settings) => match settings.try_deserialize::<StaticConfig>() {
                Ok(config) => {
                    if std::path::Path::new(path).exists() {
                        eprintln!("[INFO] Configuration loaded from: {}", path);
                    }
                    config
                }
                Err(e) => {
                    eprintln!("[ERROR] Failed to deserialize config: {}", e);
                    Self::default()
                }
            },
            Err(e) => {
                eprintln!("[ERROR] Failed to build config: {}", e);
                Self::default()
            }
        }
    }

    /// 生成示例 TOML 配置文件
    pub fn generate_sample_config() -> String {
        let sample_config = Self::default();
        toml::to_string_pretty(&sample_config)
            .unwrap_or_else(|e| format!("Error generating sample config: {}", e))
    }
}

/// 数据库连接配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_database_url")]
    pub database_url: String,
    #[serde(default = "default_database_pool_size")]
    pub pool_size: u32,
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,
    #[serde(default = "default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,
    #[serde(default = "default_retry_max_delay_ms")]
    pub retry_max_delay_ms: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            database_url: default_database_url(),
            pool_size: default_database_pool_size(),
            retry_count: default_retry_count(),
            retry_base_delay_ms: default_retry_base_delay_ms(),
            retry_max_delay_ms: default_retry_max_delay_ms(),
        }
    }
}

/// 聚合任务配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsConfig {
    /// 定时汇总间隔（秒）
    #[serde(default = "default_rollup_interval_secs")]
    pub rollup_interval_secs: u64,
    /// 原始事件保留天数
    #[serde(default = "default_event_retention_days")]
    pub event_retention_days: u64,
    /// 天级汇总保留天数
    #[serde(default = "default_stats_retention_days")]
    pub stats_retention_days: u64,
    /// ROI 计算使用的单次转化价值（micros）
    ///
    /// 外部可配置，避免把固定转化价值写死在指标里。
    #[serde(default = "default_value_per_conversion")]
    pub value_per_conversion: i64,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            rollup_interval_secs: default_rollup_interval_secs(),
            event_retention_days: default_event_retention_days(),
            stats_retention_days: default_stats_retention_days(),
            value_per_conversion: default_value_per_conversion(),
        }
    }
}

/// 优化建议阈值配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsightsConfig {
    /// CTR 低于该百分比时建议更新创意
    #[serde(default = "default_ctr_floor")]
    pub ctr_floor: f64,
    /// CPC 高于该值（micros）时建议调整定向/出价
    #[serde(default = "default_cpc_ceiling")]
    pub cpc_ceiling: i64,
    /// 曝光量低于该值时建议扩大预算/地域
    #[serde(default = "default_min_impressions")]
    pub min_impressions: i64,
    /// 转化率低于该百分比时建议优化落地页
    #[serde(default = "default_conversion_rate_floor")]
    pub conversion_rate_floor: f64,
    /// 总览报表中 Top-N 的 N
    #[serde(default = "default_top_n")]
    pub top_n: usize,
}

impl Default for InsightsConfig {
    fn default() -> Self {
        Self {
            ctr_floor: default_ctr_floor(),
            cpc_ceiling: default_cpc_ceiling(),
            min_impressions: default_min_impressions(),
            conversion_rate_floor: default_conversion_rate_floor(),
            top_n: default_top_n(),
        }
    }
}

fn default_database_url() -> String {
    "sqlite://adserve.db?mode=rwc".to_string()
}

fn default_database_pool_size() -> u32 {
    10
}

fn default_retry_count() -> u32 {
    3
}

fn default_retry_base_delay_ms() -> u64 {
    50
}

fn default_retry_max_delay_ms() -> u64 {
    2000
}

fn default_rollup_interval_secs() -> u64 {
    3600
}

fn default_event_retention_days() -> u64 {
    180
}

fn default_stats_retention_days() -> u64 {
    730
}

fn default_value_per_conversion() -> i64 {
    // 50 whole currency units
    50_000_000
}

fn default_ctr_floor() -> f64 {
    1.0
}

fn default_cpc_ceiling() -> i64 {
    // 0.50 currency units
    500_000
}

fn default_min_impressions() -> i64 {
    1000
}

fn default_conversion_rate_floor() -> f64 {
    2.0
}

fn default_top_n() -> usize {
    5
}
