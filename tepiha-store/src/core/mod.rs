//! 核心模块 - 配置
//!
//! - [`Config`] - 环境变量配置
//! - [`StoreConfig`] - 注入 `OrdersManager` 的存储参数

pub mod config;

pub use config::{Config, StoreConfig};
