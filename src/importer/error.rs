// ==========================================
// 授权凭证管理后台 - 导入模块错误类型
// ==========================================
// 工具: thiserror 派生宏
// 分级: 批次致命（文件/结构/权限） vs 行级（校验/引用/约束/持久化）
// ==========================================

use crate::domain::import::RowErrorKind;
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// 导入模块错误类型
#[derive(Error, Debug)]
pub enum ImportError {
    // ===== 文件相关错误（批次致命）=====
    #[error("文件格式不支持: {0}（仅支持 .csv/.xlsx/.xls/.xlsm/.xlsb/.ods）")]
    UnsupportedFormat(String),

    #[error("文件过大: {size} 字节，上限 {limit} 字节")]
    OversizeFile { size: usize, limit: usize },

    #[error("文件为空: 未找到表头行")]
    EmptyFile,

    #[error("Excel 解析失败: {0}")]
    ExcelParseError(String),

    #[error("CSV 解析失败: {0}")]
    CsvParseError(String),

    // ===== 结构错误（批次致命）=====
    #[error("缺少必填列: {}", .missing.join(", "))]
    SchemaError { missing: Vec<String> },

    #[error("无权限: action={action}, module={module}")]
    PermissionDenied { action: String, module: String },

    // ===== 行级错误 =====
    #[error("行校验失败 (行 {row}, 字段 {field}): {message}")]
    RowValidationError {
        row: usize,
        field: String,
        message: String,
    },

    #[error("套餐未找到: '{token}'（已知套餐: {}）", .known.join(", "))]
    PackageNotFound { token: String, known: Vec<String> },

    #[error("记录不存在: {entity} id={id}")]
    RecordNotFound { entity: String, id: i64 },

    #[error("唯一约束冲突: {identifier}")]
    ConstraintViolation { identifier: String },

    #[error("持久化失败: {0}")]
    PersistenceError(String),

    // ===== 配置错误 =====
    #[error("配置读取失败 (key: {key}): {message}")]
    ConfigReadError { key: String, message: String },

    // ===== 通用错误 =====
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ImportError {
    /// 行级错误分类；批次致命错误返回 None
    pub fn row_kind(&self) -> Option<RowErrorKind> {
        match self {
            ImportError::RowValidationError { .. } => Some(RowErrorKind::RowValidation),
            ImportError::PackageNotFound { .. } => Some(RowErrorKind::PackageNotFound),
            ImportError::RecordNotFound { .. } => Some(RowErrorKind::RecordNotFound),
            ImportError::ConstraintViolation { .. } => Some(RowErrorKind::ConstraintViolation),
            ImportError::PersistenceError(_) => Some(RowErrorKind::Persistence),
            ImportError::InternalError(_) | ImportError::Other(_) => Some(RowErrorKind::Internal),
            _ => None,
        }
    }

    pub fn is_persistence(&self) -> bool {
        matches!(self, ImportError::PersistenceError(_))
    }
}

// 实现 From<RepositoryError>
impl From<RepositoryError> for ImportError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::UniqueConstraintViolation(msg) => {
                ImportError::ConstraintViolation { identifier: msg }
            }
            RepositoryError::NotFound { entity, id } => ImportError::RecordNotFound { entity, id },
            RepositoryError::ForeignKeyViolation(msg) => ImportError::ConstraintViolation {
                identifier: format!("外键约束: {}", msg),
            },
            other => ImportError::PersistenceError(other.to_string()),
        }
    }
}

// 实现 From<rusqlite::Error>
impl From<rusqlite::Error> for ImportError {
    fn from(err: rusqlite::Error) -> Self {
        ImportError::from(RepositoryError::from(err))
    }
}

// 实现 From<csv::Error>
impl From<csv::Error> for ImportError {
    fn from(err: csv::Error) -> Self {
        ImportError::CsvParseError(err.to_string())
    }
}

// 实现 From<calamine::Error>
impl From<calamine::Error> for ImportError {
    fn from(err: calamine::Error) -> Self {
        ImportError::ExcelParseError(err.to_string())
    }
}

/// Result 类型别名
pub type ImportResult<T> = Result<T, ImportError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_kind_classification() {
        let err = ImportError::PackageNotFound {
            token: "Gold".to_string(),
            known: vec!["Pro".to_string()],
        };
        assert_eq!(err.row_kind(), Some(RowErrorKind::PackageNotFound));
        assert!(err.to_string().contains("Pro"));

        let fatal = ImportError::OversizeFile { size: 11, limit: 10 };
        assert_eq!(fatal.row_kind(), None);
    }

    #[test]
    fn test_repository_error_mapping() {
        let err: ImportError =
            RepositoryError::UniqueConstraintViolation("credential.email".to_string()).into();
        assert!(matches!(err, ImportError::ConstraintViolation { .. }));

        let err: ImportError = RepositoryError::LockError("poisoned".to_string()).into();
        assert!(err.is_persistence());
    }
}
