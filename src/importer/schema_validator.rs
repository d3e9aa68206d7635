// ==========================================
// 授权凭证管理后台 - 结构校验器
// ==========================================
// 阶段 2: 列集合校验 + 抽样行校验
// 规则: 仅缺少必填列时整批拒绝；行级错误不阻塞其他行
// ==========================================

use crate::config::SchemaConfig;
use crate::domain::import::{RowError, ValidationReport};
use crate::domain::row::{HeaderIndex, ParsedSheet, RawRow};
use crate::domain::types::FieldKind;
use crate::importer::error::{ImportError, ImportResult};
use once_cell::sync::Lazy;
use regex::Regex;

static EMAIL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("Invalid regex pattern for email check")
});

/// 邮箱格式检查
pub fn is_valid_email(value: &str) -> bool {
    EMAIL_PATTERN.is_match(value)
}

/// 电话号码去格式化
///
/// 去掉空格、短横线、括号与一个前导 '+'，剩余部分必须全为数字
pub fn strip_tel(value: &str) -> Option<String> {
    let trimmed = value.trim();
    let body = trimmed.strip_prefix('+').unwrap_or(trimmed);
    let digits: String = body
        .chars()
        .filter(|c| !matches!(c, ' ' | '-' | '(' | ')'))
        .collect();

    if !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()) {
        Some(digits)
    } else {
        None
    }
}

pub struct SchemaValidator {
    config: SchemaConfig,
}

impl SchemaValidator {
    pub fn new(config: SchemaConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SchemaConfig {
        &self.config
    }

    /// 生成校验报告（无副作用）
    pub fn validate(&self, sheet: &ParsedSheet) -> ValidationReport {
        let header = sheet.header_index();
        let mut report = ValidationReport::new(sheet.rows.len());

        report.missing_required_columns = self
            .config
            .required_columns()
            .filter(|spec| !header.contains(&spec.name))
            .map(|spec| spec.name.clone())
            .collect();

        report.extra_columns = header
            .names()
            .iter()
            .filter(|name| !name.is_empty() && !self.config.is_expected(name))
            .cloned()
            .collect();

        let sample = self.config.sample_rows.min(sheet.rows.len());
        for row in sheet.rows.iter().take(sample) {
            report.extend_row_errors(self.check_row(&header, row));
        }

        report
    }

    /// 结构性检查（缺必填列 → SchemaError）
    pub fn ensure_structure(report: &ValidationReport) -> ImportResult<()> {
        if report.is_structurally_valid() {
            Ok(())
        } else {
            Err(ImportError::SchemaError {
                missing: report.missing_required_columns.iter().cloned().collect(),
            })
        }
    }

    fn check_row(&self, header: &HeaderIndex, row: &RawRow) -> Vec<RowError> {
        let mut errors = Vec::new();

        for spec in &self.config.columns {
            if !header.contains(&spec.name) {
                continue;
            }

            let value = match row.text(&spec.name) {
                Some(v) => v,
                None => {
                    if spec.required {
                        errors.push(RowError {
                            row_index: row.row_number(),
                            field: spec.name.clone(),
                            message: "必填字段为空".to_string(),
                        });
                    }
                    continue;
                }
            };

            match spec.kind {
                FieldKind::Email if !is_valid_email(&value) => errors.push(RowError {
                    row_index: row.row_number(),
                    field: spec.name.clone(),
                    message: format!("邮箱格式无效: {}", value),
                }),
                FieldKind::Tel if strip_tel(&value).is_none() => errors.push(RowError {
                    row_index: row.row_number(),
                    field: spec.name.clone(),
                    message: format!("电话号码必须为数字: {}", value),
                }),
                _ => {}
            }
        }

        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::CellValue;

    fn sheet(headers: &[&str], rows: &[&[&str]]) -> ParsedSheet {
        ParsedSheet::from_cells(
            headers.iter().map(|h| h.to_string()).collect(),
            rows.iter()
                .map(|r| {
                    r.iter()
                        .map(|v| {
                            if v.is_empty() {
                                CellValue::Empty
                            } else {
                                CellValue::Text(v.to_string())
                            }
                        })
                        .collect()
                })
                .collect(),
        )
    }

    #[test]
    fn test_email_pattern() {
        assert!(is_valid_email("ops@example.com"));
        assert!(!is_valid_email("ops@example"));
        assert!(!is_valid_email("ops example@x.com"));
        assert!(!is_valid_email("@x.com"));
    }

    #[test]
    fn test_strip_tel() {
        assert_eq!(strip_tel("+62 (21) 555-0100"), Some("62215550100".to_string()));
        assert_eq!(strip_tel("0812"), Some("0812".to_string()));
        assert_eq!(strip_tel("12a4"), None);
        assert_eq!(strip_tel("++12"), None);
        assert_eq!(strip_tel("--"), None);
    }

    #[test]
    fn test_missing_required_columns() {
        let validator = SchemaValidator::new(SchemaConfig::ledger());
        let data = sheet(&["date", "hoDate", "accMail"], &[&["45658", "45660", "a@b.com"]]);

        let report = validator.validate(&data);
        assert!(!report.is_structurally_valid());
        assert!(report.missing_required_columns.contains("reseller"));
        assert!(matches!(
            SchemaValidator::ensure_structure(&report),
            Err(ImportError::SchemaError { .. })
        ));
    }

    #[test]
    fn test_extra_columns_and_case_insensitive_headers() {
        let validator = SchemaValidator::new(SchemaConfig::credential_only());
        let data = sheet(&["EMAIL", "Password", "notes"], &[&["a@b.com", "x", "hi"]]);

        let report = validator.validate(&data);
        assert!(report.is_structurally_valid());
        assert_eq!(report.extra_columns.len(), 1);
        assert!(report.extra_columns.contains("notes"));
        assert!(report.row_errors.is_empty());
    }

    #[test]
    fn test_sample_rows_checked() {
        let validator = SchemaValidator::new(SchemaConfig::ledger().with_sample_rows(2));
        let data = sheet(
            &["date", "reseller", "hoDate", "email", "tel"],
            &[
                &["45658", "1", "45660", "bad-email", "abc"],
                &["45658", "", "45660", "ok@x.com", "0812-1"],
                &["45658", "", "45660", "also-bad", ""],
            ],
        );

        let report = validator.validate(&data);
        assert_eq!(report.total_row_count, 3);
        // 第 3 行超出抽样范围
        assert!(!report.has_row_error(3));
        assert_eq!(report.errors_for_row(1).len(), 2);
        assert_eq!(report.errors_for_row(2)[0].field, "reseller");
        assert_eq!(report.valid_row_count, 1);
    }
}
