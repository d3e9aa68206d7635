// ==========================================
// 授权凭证管理后台 - 核心库
// ==========================================
// 技术栈: Rust + SQLite
// 系统定位: 授权凭证台账批量导入与对账
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 导入层 - 外部数据
pub mod importer;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一）
pub mod db;

// 日志系统
pub mod logging;

// 外部协作方 - 权限/通知
pub mod gateway;

// API 层 - 业务接口
pub mod api;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{CellValue, ImportIntent};

// 领域实体
pub use domain::{
    BatchResult, Credential, ImportBatch, Package, ParsedSheet, Reseller, RowResult, Sale, User,
};

// 导入器
pub use importer::{CredentialImporter, CredentialImporterImpl, ImportError, ImportRequest};

// API
pub use api::{ApiError, ImportApi};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "授权凭证管理后台";
