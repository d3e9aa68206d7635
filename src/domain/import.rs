// ==========================================
// 授权凭证管理后台 - 导入领域模型
// ==========================================
// 职责: 校验报告、标准化记录、实体引用、行结果、批次结果
// ==========================================

use crate::domain::types::ImportIntent;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};

// ==========================================
// RowError - 行级校验错误
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RowError {
    pub row_index: usize, // 源文件数据行号
    pub field: String,
    pub message: String,
}

// ==========================================
// ValidationReport - 校验报告
// ==========================================
// 不变量: valid_row_count = total_row_count - distinct(row_errors.row_index)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub missing_required_columns: BTreeSet<String>,
    pub extra_columns: BTreeSet<String>,
    pub row_errors: Vec<RowError>,
    pub valid_row_count: usize,
    pub total_row_count: usize,
}

impl ValidationReport {
    pub fn new(total_row_count: usize) -> Self {
        Self {
            total_row_count,
            valid_row_count: total_row_count,
            ..Default::default()
        }
    }

    /// 结构性错误（缺必填列）时整批拒绝
    pub fn is_structurally_valid(&self) -> bool {
        self.missing_required_columns.is_empty()
    }

    pub fn push_row_error(&mut self, error: RowError) {
        self.row_errors.push(error);
        self.recount();
    }

    pub fn extend_row_errors<I: IntoIterator<Item = RowError>>(&mut self, errors: I) {
        self.row_errors.extend(errors);
        self.recount();
    }

    pub fn has_row_error(&self, row_index: usize) -> bool {
        self.row_errors.iter().any(|e| e.row_index == row_index)
    }

    pub fn errors_for_row(&self, row_index: usize) -> Vec<&RowError> {
        self.row_errors
            .iter()
            .filter(|e| e.row_index == row_index)
            .collect()
    }

    fn recount(&mut self) {
        let distinct: HashSet<usize> = self.row_errors.iter().map(|e| e.row_index).collect();
        self.valid_row_count = self.total_row_count.saturating_sub(distinct.len());
    }
}

// ==========================================
// NormalizedRecord - 类型转换后的记录
// ==========================================
// 缺失字段保持 None，写入时不覆盖已有值
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NormalizedRecord {
    pub row_number: usize,

    // ===== 凭证 =====
    pub id: Option<i64>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub package: Option<String>, // 套餐引用（id 或名称，待解析）
    pub quota: Option<i64>,
    pub code: Option<String>,
    pub act_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,

    // ===== 关联引用 =====
    pub user_id: Option<i64>,
    pub reseller: Option<String>,

    // ===== 销售台账 =====
    pub sale_date: Option<DateTime<Utc>>,
    pub ho_date: Option<DateTime<Utc>>,
    pub msp_create: Option<DateTime<Utc>>,

    // ===== 客户资料 =====
    pub user_name: Option<String>,
    pub user_email: Option<String>,
    pub company: Option<String>,
    pub tel: Option<i64>,
    pub address: Option<String>,
    pub city: Option<String>,
}

impl NormalizedRecord {
    pub fn has_user_profile(&self) -> bool {
        self.user_name.is_some()
            || self.user_email.is_some()
            || self.company.is_some()
            || self.tel.is_some()
            || self.address.is_some()
            || self.city.is_some()
    }
}

// ==========================================
// EntityReferences - 已解析的实体引用
// ==========================================
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityReferences {
    pub package_id: Option<i64>,
    pub user_id: Option<i64>,
    pub reseller_id: Option<i64>,
}

// ==========================================
// RowAction - 行写入动作
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RowAction {
    Created,
    Updated,
}

// ==========================================
// RowErrorKind - 行失败分类
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RowErrorKind {
    RowValidation,
    PackageNotFound,
    RecordNotFound,
    ConstraintViolation,
    Persistence,
    Internal,
}

// ==========================================
// RowResult - 单行处理结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowResult {
    pub row: usize,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credential_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<RowAction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<RowErrorKind>,
}

// ==========================================
// BatchCounts - 批次计数
// ==========================================
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchCounts {
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize, // 系统性失败中止后未处理的行
    pub total: usize,
}

// ==========================================
// BatchResult - 批次结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchResult {
    pub batch_id: String,
    pub intent: ImportIntent,
    pub success: bool, // 无失败行且无致命错误
    pub validation: ValidationReport,
    pub results: Vec<RowResult>,
    pub counts: BatchCounts,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fatal_error: Option<String>,
    pub elapsed_ms: u64,
}

impl BatchResult {
    pub fn failed_rows(&self) -> impl Iterator<Item = &RowResult> {
        self.results.iter().filter(|r| !r.success)
    }
}

// ==========================================
// ImportBatch - 导入批次记录
// ==========================================
// 对齐: import_batch 表
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportBatch {
    pub batch_id: String,
    pub file_name: Option<String>,
    pub intent: ImportIntent,
    pub total_rows: i64,
    pub succeeded_rows: i64,
    pub failed_rows: i64,
    pub skipped_rows: i64,
    pub imported_by: Option<String>,
    pub imported_at: DateTime<Utc>,
    pub elapsed_ms: i64,
    pub report_json: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn err(row: usize, field: &str) -> RowError {
        RowError {
            row_index: row,
            field: field.to_string(),
            message: "bad".to_string(),
        }
    }

    #[test]
    fn test_valid_row_count_counts_distinct_rows() {
        let mut report = ValidationReport::new(5);
        report.push_row_error(err(1, "email"));
        report.push_row_error(err(1, "tel"));
        report.push_row_error(err(3, "date"));

        assert_eq!(report.row_errors.len(), 3);
        assert_eq!(report.valid_row_count, 3);
        assert!(report.has_row_error(1));
        assert!(!report.has_row_error(2));
        assert_eq!(report.errors_for_row(1).len(), 2);
    }

    #[test]
    fn test_structural_validity() {
        let mut report = ValidationReport::new(0);
        assert!(report.is_structurally_valid());
        report.missing_required_columns.insert("date".to_string());
        assert!(!report.is_structurally_valid());
    }

    #[test]
    fn test_record_user_profile_detection() {
        let mut record = NormalizedRecord::default();
        assert!(!record.has_user_profile());
        record.city = Some("Bangkok".to_string());
        assert!(record.has_user_profile());
    }
}
