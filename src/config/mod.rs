// ==========================================
// 授权凭证管理后台 - 配置层
// ==========================================
// 职责: 导入列配置 + 运行参数读取
// 存储: config_kv 表
// ==========================================

pub mod config_manager;
pub mod import_config_trait;
pub mod schema_config;

// 重导出核心配置类型
pub use config_manager::{config_keys, defaults, ConfigManager};
pub use import_config_trait::ImportConfigReader;
pub use schema_config::{ColumnSpec, SchemaConfig};
