// ==========================================
// 授权凭证管理后台 - 领域类型定义
// ==========================================
// 职责: 导入意图、文件类型、单元格值、字段类型等基础枚举
// 约束: 序列化格式统一为 SCREAMING_SNAKE_CASE
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// ImportIntent - 导入意图
// ==========================================
// 决定列集合与必填列（见 config::schema_config）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ImportIntent {
    Ledger,         // 主台账导入（含经销商/销售日期）
    CredentialOnly, // 仅凭证导入（账号 + 密码）
}

impl ImportIntent {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImportIntent::Ledger => "LEDGER",
            ImportIntent::CredentialOnly => "CREDENTIAL_ONLY",
        }
    }
}

impl fmt::Display for ImportIntent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ImportIntent {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "LEDGER" => Ok(ImportIntent::Ledger),
            "CREDENTIAL_ONLY" | "CREDENTIAL" => Ok(ImportIntent::CredentialOnly),
            other => Err(format!("未知导入意图: {}", other)),
        }
    }
}

// ==========================================
// FileKind - 文件类型
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FileKind {
    Csv,
    Spreadsheet,
}

// ==========================================
// CellValue - 原始单元格值
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CellValue {
    Empty,
    Text(String),
    Number(f64),
}

impl CellValue {
    /// 空字符串与空单元格等价
    pub fn is_empty(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.trim().is_empty(),
            CellValue::Number(_) => false,
        }
    }

    /// 转为去空白文本，空值返回 None
    pub fn as_text(&self) -> Option<String> {
        match self {
            CellValue::Empty => None,
            CellValue::Text(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    None
                } else {
                    Some(trimmed.to_string())
                }
            }
            CellValue::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 1e15 {
                    Some(format!("{}", *n as i64))
                } else {
                    Some(n.to_string())
                }
            }
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.as_text() {
            Some(s) => write!(f, "{}", s),
            None => Ok(()),
        }
    }
}

// ==========================================
// FieldKind - 字段校验/转换类型
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldKind {
    Text,
    Email,
    Tel,
    Integer,
    Date,
}

// ==========================================
// FieldTarget - 列映射目标
// ==========================================
// 同名列在不同导入意图下可能映射到不同实体字段
// 例如 email: 台账中为客户邮箱，凭证导入中为账号邮箱
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldTarget {
    CredentialId,
    CredentialEmail,
    Password,
    Package,
    Quota,
    Code,
    UserId,
    ActDate,
    EndDate,
    Reseller,
    SaleDate,
    HoDate,
    MspCreate,
    UserName,
    UserEmail,
    Company,
    Tel,
    Address,
    City,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_value_empty() {
        assert!(CellValue::Empty.is_empty());
        assert!(CellValue::Text("   ".to_string()).is_empty());
        assert!(!CellValue::Number(0.0).is_empty());
    }

    #[test]
    fn test_cell_value_as_text() {
        assert_eq!(CellValue::Text("  pro ".to_string()).as_text(), Some("pro".to_string()));
        assert_eq!(CellValue::Number(10.0).as_text(), Some("10".to_string()));
        assert_eq!(CellValue::Number(2.5).as_text(), Some("2.5".to_string()));
        assert_eq!(CellValue::Empty.as_text(), None);
    }

    #[test]
    fn test_import_intent_parse() {
        assert_eq!("ledger".parse::<ImportIntent>(), Ok(ImportIntent::Ledger));
        assert_eq!(
            "credential_only".parse::<ImportIntent>(),
            Ok(ImportIntent::CredentialOnly)
        );
        assert!("other".parse::<ImportIntent>().is_err());
    }
}
