// ==========================================
// 授权凭证管理后台 - 领域模型层
// ==========================================
// 职责: 定义领域实体、导入值对象、基础类型
// 红线: 不含数据访问逻辑,不含导入流程逻辑
// ==========================================

pub mod entity;
pub mod import;
pub mod row;
pub mod types;

// 重导出核心类型
pub use entity::{Credential, NewCredential, Package, Reseller, Sale, User};
pub use import::{
    BatchCounts, BatchResult, EntityReferences, ImportBatch, NormalizedRecord, RowAction,
    RowError, RowErrorKind, RowResult, ValidationReport,
};
pub use row::{HeaderIndex, ParsedSheet, RawRow};
pub use types::{CellValue, FieldKind, FieldTarget, FileKind, ImportIntent};
