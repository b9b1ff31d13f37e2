use crate::orders::limiter::DEFAULT_MAX_ACTIVE_PER_CLIENT;
use crate::orders::migration::DEFAULT_READY_GRACE_MS;
use std::path::PathBuf;

/// Store service settings injected into [`OrdersManager`](crate::OrdersManager)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreConfig {
    /// 每个客户最多同时持有的活跃订单数
    pub max_active_per_client: usize,
    /// 迁移时 ready 订单的时间戳宽限 (毫秒)
    pub ready_grace_ms: i64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            max_active_per_client: DEFAULT_MAX_ACTIVE_PER_CLIENT,
            ready_grace_ms: DEFAULT_READY_GRACE_MS,
        }
    }
}

/// 订单存储配置
///
/// # 环境变量
///
/// | 环境变量 | 默认值 | 说明 |
/// |----------|--------|------|
/// | WORK_DIR | ./data | 工作目录 (数据库、日志) |
/// | ORDERS_DB_FILE | orders.redb | 数据库文件名 |
/// | MAX_ACTIVE_PER_CLIENT | 1 | 每个客户的活跃订单上限 |
/// | READY_GRACE_MS | 5000 | 迁移宽限窗口 (毫秒) |
/// | LOG_LEVEL | info | 日志级别 |
/// | LOG_DIR | (未设置) | 滚动日志目录 |
///
/// # 示例
///
/// ```ignore
/// WORK_DIR=/data/tepiha MAX_ACTIVE_PER_CLIENT=2 cargo test
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// 工作目录
    pub work_dir: String,
    /// 数据库文件名 (相对 work_dir)
    pub orders_db_file: String,
    pub max_active_per_client: usize,
    pub ready_grace_ms: i64,
    pub log_level: String,
    /// 设置后日志写入按天滚动的文件
    pub log_dir: Option<String>,
}

impl Config {
    /// 从环境变量加载配置
    ///
    /// 如果环境变量未设置或无法解析，使用默认值
    pub fn from_env() -> Self {
        Self {
            work_dir: std::env::var("WORK_DIR").unwrap_or_else(|_| "./data".into()),
            orders_db_file: std::env::var("ORDERS_DB_FILE")
                .unwrap_or_else(|_| "orders.redb".into()),
            max_active_per_client: std::env::var("MAX_ACTIVE_PER_CLIENT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_MAX_ACTIVE_PER_CLIENT),
            ready_grace_ms: std::env::var("READY_GRACE_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_READY_GRACE_MS),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            log_dir: std::env::var("LOG_DIR").ok().filter(|v| !v.trim().is_empty()),
        }
    }

    /// 使用指定工作目录覆盖配置
    ///
    /// 常用于测试场景
    pub fn with_work_dir(work_dir: impl Into<String>) -> Self {
        let mut config = Self::from_env();
        config.work_dir = work_dir.into();
        config
    }

    /// Full path of the store file
    pub fn db_path(&self) -> PathBuf {
        PathBuf::from(&self.work_dir).join(&self.orders_db_file)
    }

    pub fn store_config(&self) -> StoreConfig {
        StoreConfig {
            max_active_per_client: self.max_active_per_client,
            ready_grace_ms: self.ready_grace_ms,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
