//! Tepiha Store - 地毯清洗订单的本地存储核心
//!
//! # 架构概述
//!
//! 单设备上的订单集合是唯一数据源，远端同步为可选。本 crate 提供：
//!
//! - **订单存储** (`orders::storage`): redb 单文件存储，整个集合一次事务写入
//! - **合并引擎** (`orders::merge`): 状态只进不退的 last-write-wins
//! - **客户限额** (`orders::limiter`): 每个客户的活跃订单上限
//! - **搜索** (`orders::search`): 姓名 / 电话 / 编号，忽略大小写和变音符
//! - **同步** (`orders::sync`): 可插拔的远端 fetch / push
//!
//! # 模块结构
//!
//! ```text
//! tepiha-store/src/
//! ├── core/          # 配置
//! ├── utils/         # 日志
//! └── orders/        # 存储、合并、查询、同步
//! ```

pub mod core;
pub mod orders;
pub mod utils;

// Re-export 公共类型
pub use core::{Config, StoreConfig};
pub use orders::{
    ManagerError, ManagerResult, MemoryRemote, NoopRemote, OrderStorage, OrdersManager,
    RemoteOrders,
};

// Re-export logger functions
pub use utils::logger::{init_logger, init_logger_with_file};

/// Load `.env`, initialize logging and return the configuration
pub fn setup_environment() -> Config {
    if let Err(e) = dotenv::dotenv() {
        // .env is optional
        eprintln!("no .env loaded: {e}");
    }
    let config = Config::from_env();
    init_logger_with_file(Some(&config.log_level), config.log_dir.as_deref());
    config
}

/// Open the store described by `config`, creating the work directory if needed
pub fn open_store(config: &Config) -> ManagerResult<OrdersManager> {
    if let Err(e) = std::fs::create_dir_all(&config.work_dir) {
        tracing::warn!(work_dir = %config.work_dir, error = %e, "Failed to create work directory");
    }
    OrdersManager::open(config.db_path(), config.store_config())
}
