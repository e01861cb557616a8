//! SeaORM storage backend
//!
//! This module provides database storage using SeaORM,
//! supporting SQLite, MySQL/MariaDB, and PostgreSQL.

mod analytics;
mod connection;
mod converters;
mod events;
mod operations;
pub mod retry;

use sea_orm::DatabaseConnection;

use crate::errors::{AdServeError, Result};
use crate::storage::models::AdStatus;

pub use connection::{connect_generic, connect_sqlite, run_migrations};
pub use converters::{advertisement_to_active_model, model_to_advertisement};

/// 从数据库 URL 推断数据库类型
pub fn infer_backend_from_url(database_url: &str) -> Result<String> {
    if database_url.starts_with("sqlite://")
        || database_url.ends_with(".db")
        || database_url.ends_with(".sqlite")
        || database_url == ":memory:"
    {
        Ok("sqlite".to_string())
    } else if database_url.starts_with("mysql://") || database_url.starts_with("mariadb://") {
        Ok("mysql".to_string())
    } else if database_url.starts_with("postgres://") || database_url.starts_with("postgresql://") {
        Ok("postgres".to_string())
    } else {
        Err(AdServeError::database_config(format!(
            "无法从 URL 推断数据库类型: {}. 支持的 URL 格式: sqlite://, mysql://, mariadb://, postgres://",
            database_url
        )))
    }
}

/// 规范化 backend 名称
pub fn normalize_backend_name(backend: &str) -> String {
    match backend {
        "mariadb" => "mysql".to_string(),
        other => other.to_string(),
    }
}

/// 广告列表过滤条件
#[derive(Default, Clone, Debug)]
pub struct AdFilter {
    /// 只返回该广告主的广告
    pub advertiser_id: Option<String>,
    /// 按状态过滤
    pub status: Option<AdStatus>,
    /// 按广告系列过滤
    pub campaign_id: Option<String>,
    /// 只返回当前可投放的广告（active + 窗口内）
    pub only_serving: bool,
}

/// SeaORM-based storage backend
#[derive(Clone)]
pub struct SeaOrmStorage {
    db: DatabaseConnection,
    backend_name: String,
    /// 重试配置
    retry_config: retry::RetryConfig,
}

impl SeaOrmStorage {
    pub async fn new(database_url: &str, backend_name: &str) -> Result<Self> {
        if database_url.is_empty() {
            return Err(AdServeError::database_config(
                "DATABASE_URL 未设置".to_string(),
            ));
        }

        // 读取重试配置
        let config = crate::config::get_config();
        let retry_config = retry::RetryConfig {
            max_retries: config.database.retry_count,
            base_delay_ms: config.database.retry_base_delay_ms,
            max_delay_ms: config.database.retry_max_delay_ms,
        };

        let backend_name = normalize_backend_name(backend_name);
        let db = match backend_name.as_str() {
            "sqlite" => connect_sqlite(database_url).await?,
            other => connect_generic(database_url, other).await?,
        };

        run_migrations(&db).await?;

        Ok(Self {
            db,
            backend_name,
            retry_config,
        })
    }

    pub fn get_db(&self) -> &DatabaseConnection {
        &self.db
    }

    pub fn backend_name(&self) -> &str {
        &self.backend_name
    }

    pub(crate) fn retry_config(&self) -> retry::RetryConfig {
        self.retry_config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_infer_backend_from_url() {
        assert_eq!(infer_backend_from_url("sqlite://ads.db").unwrap(), "sqlite");
        assert_eq!(
            infer_backend_from_url("mysql://user@host/db").unwrap(),
            "mysql"
        );
        assert_eq!(
            infer_backend_from_url("postgres://user@host/db").unwrap(),
            "postgres"
        );
        assert!(infer_backend_from_url("ftp://nope").is_err());
    }

    #[test]
    fn test_normalize_backend_name() {
        assert_eq!(normalize_backend_name("mariadb"), "mysql");
        assert_eq!(normalize_backend_name("sqlite"), "sqlite");
    }
}
