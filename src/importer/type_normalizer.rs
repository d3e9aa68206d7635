// ==========================================
// 授权凭证管理后台 - 类型转换器
// ==========================================
// 阶段 3: 原始单元格 → 标准化记录
// 规则: 序列号日期换算、字符串日期解析、整数解析
// 红线: 无法解析的值记为行级错误，不得静默置零
// ==========================================

use crate::config::SchemaConfig;
use crate::domain::import::{NormalizedRecord, RowError};
use crate::domain::row::RawRow;
use crate::domain::types::{CellValue, FieldKind, FieldTarget};
use crate::importer::schema_validator::strip_tel;
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, TimeZone, Utc};

/// 电子表格序列号与 Unix 纪元的日差（1970-01-01 的序列号）
pub const SERIAL_EPOCH_OFFSET: i64 = 25569;

const DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y/%m/%d %H:%M:%S"];
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%d/%m/%Y", "%Y%m%d"];

/// 序列号 → UTC 零点
///
/// date = 1970-01-01 + (trunc(serial) - 25569) 天
pub fn serial_to_date(serial: f64) -> Option<DateTime<Utc>> {
    if !serial.is_finite() {
        return None;
    }
    let days = serial.trunc();
    if days.abs() > 3_000_000.0 {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1970, 1, 1)?;
    let date = epoch.checked_add_signed(Duration::days(days as i64 - SERIAL_EPOCH_OFFSET))?;
    Some(Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0)?))
}

/// 字符串日期解析（不含纯数字序列号）
pub fn parse_date_str(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }

    for fmt in DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, fmt) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }

    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(value, fmt) {
            return date.and_hms_opt(0, 0, 0).map(|n| Utc.from_utc_datetime(&n));
        }
    }

    None
}

fn is_numeric_text(value: &str) -> bool {
    let mut seen_dot = false;
    !value.is_empty()
        && value.chars().all(|c| {
            if c == '.' && !seen_dot {
                seen_dot = true;
                true
            } else {
                c.is_ascii_digit()
            }
        })
}

/// 单元格 → 日期
///
/// 数值单元格按序列号换算；纯数字文本优先按 YYYYMMDD 解析，失败再按序列号换算
pub fn parse_date_cell(cell: &CellValue) -> Result<Option<DateTime<Utc>>, String> {
    match cell {
        CellValue::Empty => Ok(None),
        CellValue::Number(n) => serial_to_date(*n)
            .map(Some)
            .ok_or_else(|| format!("日期序列号超出范围: {}", n)),
        CellValue::Text(s) => {
            let s = s.trim();
            if s.is_empty() {
                return Ok(None);
            }
            if is_numeric_text(s) {
                if s.len() == 8 {
                    if let Some(dt) = parse_date_str(s) {
                        return Ok(Some(dt));
                    }
                }
                return s
                    .parse::<f64>()
                    .ok()
                    .and_then(serial_to_date)
                    .map(Some)
                    .ok_or_else(|| format!("日期序列号超出范围: {}", s));
            }
            parse_date_str(s)
                .map(Some)
                .ok_or_else(|| format!("无法解析的日期: {}", s))
        }
    }
}

fn integral(n: f64) -> Option<i64> {
    if n.is_finite() && n.fract() == 0.0 && n.abs() < 9.0e15 {
        Some(n as i64)
    } else {
        None
    }
}

/// 单元格 → 整数（数值单元格须无小数部分）
pub fn parse_integer_cell(cell: &CellValue) -> Result<Option<i64>, String> {
    match cell {
        CellValue::Empty => Ok(None),
        CellValue::Number(n) => integral(*n)
            .map(Some)
            .ok_or_else(|| format!("不是整数: {}", n)),
        CellValue::Text(s) => {
            let s = s.trim();
            if s.is_empty() {
                return Ok(None);
            }
            if let Ok(v) = s.parse::<i64>() {
                return Ok(Some(v));
            }
            s.parse::<f64>()
                .ok()
                .and_then(integral)
                .map(Some)
                .ok_or_else(|| format!("不是整数: {}", s))
        }
    }
}

/// 单元格 → 电话号码（去格式化后按整数解析）
pub fn parse_tel_cell(cell: &CellValue) -> Result<Option<i64>, String> {
    match cell {
        CellValue::Text(s) if !s.trim().is_empty() => strip_tel(s)
            .and_then(|digits| digits.parse::<i64>().ok())
            .map(Some)
            .ok_or_else(|| format!("电话号码必须为数字: {}", s.trim())),
        other => parse_integer_cell(other),
    }
}

pub struct TypeNormalizer {
    config: SchemaConfig,
}

impl TypeNormalizer {
    pub fn new(config: SchemaConfig) -> Self {
        Self { config }
    }

    /// 转换一行，收集该行全部错误
    pub fn normalize(&self, row: &RawRow) -> Result<NormalizedRecord, Vec<RowError>> {
        let mut record = NormalizedRecord {
            row_number: row.row_number(),
            ..Default::default()
        };
        let mut errors = Vec::new();

        for spec in &self.config.columns {
            let cell = match row.get(&spec.name) {
                Some(cell) if !cell.is_empty() => cell,
                _ => continue,
            };

            let outcome = match spec.kind {
                FieldKind::Text | FieldKind::Email => {
                    Self::apply_text(&mut record, spec.target, cell.as_text());
                    Ok(())
                }
                FieldKind::Date => parse_date_cell(cell)
                    .map(|value| Self::apply_date(&mut record, spec.target, value)),
                FieldKind::Integer => parse_integer_cell(cell)
                    .map(|value| Self::apply_integer(&mut record, spec.target, value)),
                FieldKind::Tel => {
                    parse_tel_cell(cell).map(|value| Self::apply_integer(&mut record, spec.target, value))
                }
            };

            if let Err(message) = outcome {
                errors.push(RowError {
                    row_index: row.row_number(),
                    field: spec.name.clone(),
                    message,
                });
            }
        }

        if errors.is_empty() {
            Ok(record)
        } else {
            Err(errors)
        }
    }

    fn apply_text(record: &mut NormalizedRecord, target: FieldTarget, value: Option<String>) {
        match target {
            FieldTarget::CredentialEmail => record.email = value,
            FieldTarget::Password => record.password = value,
            FieldTarget::Package => record.package = value,
            FieldTarget::Code => record.code = value,
            FieldTarget::Reseller => record.reseller = value,
            FieldTarget::UserName => record.user_name = value,
            FieldTarget::UserEmail => record.user_email = value,
            FieldTarget::Company => record.company = value,
            FieldTarget::Address => record.address = value,
            FieldTarget::City => record.city = value,
            _ => {}
        }
    }

    fn apply_date(record: &mut NormalizedRecord, target: FieldTarget, value: Option<DateTime<Utc>>) {
        match target {
            FieldTarget::ActDate => record.act_date = value,
            FieldTarget::EndDate => record.end_date = value,
            FieldTarget::SaleDate => record.sale_date = value,
            FieldTarget::HoDate => record.ho_date = value,
            FieldTarget::MspCreate => record.msp_create = value,
            _ => {}
        }
    }

    fn apply_integer(record: &mut NormalizedRecord, target: FieldTarget, value: Option<i64>) {
        match target {
            FieldTarget::CredentialId => record.id = value,
            FieldTarget::Quota => record.quota = value,
            FieldTarget::UserId => record.user_id = value,
            FieldTarget::Tel => record.tel = value,
            _ => {}
        }
    }
}
