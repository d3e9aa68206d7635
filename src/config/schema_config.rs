// ==========================================
// 授权凭证管理后台 - 导入列配置
// ==========================================
// 职责: 按导入意图给出期望列、必填列、字段类型与映射目标
// 约束: 所有校验逻辑只读取本配置，不在调用处另写列清单
// ==========================================

use crate::domain::types::{FieldKind, FieldTarget, ImportIntent};
use serde::{Deserialize, Serialize};

/// 默认抽样校验行数
pub const DEFAULT_SAMPLE_ROWS: usize = 5;

// ==========================================
// ColumnSpec - 单列定义
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub name: String,
    pub kind: FieldKind,
    pub target: FieldTarget,
    pub required: bool,
}

impl ColumnSpec {
    fn new(name: &str, kind: FieldKind, target: FieldTarget) -> Self {
        Self {
            name: name.to_string(),
            kind,
            target,
            required: false,
        }
    }

    fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

// ==========================================
// SchemaConfig - 导入列集合
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaConfig {
    pub intent: ImportIntent,
    pub columns: Vec<ColumnSpec>,
    pub sample_rows: usize,
}

impl SchemaConfig {
    pub fn for_intent(intent: ImportIntent) -> Self {
        match intent {
            ImportIntent::Ledger => Self::ledger(),
            ImportIntent::CredentialOnly => Self::credential_only(),
        }
    }

    /// 主台账导入
    ///
    /// accMail 为凭证账号邮箱，email 为客户邮箱
    pub fn ledger() -> Self {
        use FieldKind as K;
        use FieldTarget as T;

        Self {
            intent: ImportIntent::Ledger,
            columns: vec![
                ColumnSpec::new("id", K::Integer, T::CredentialId),
                ColumnSpec::new("mspCreate", K::Date, T::MspCreate),
                ColumnSpec::new("date", K::Date, T::SaleDate).required(),
                ColumnSpec::new("reseller", K::Text, T::Reseller).required(),
                ColumnSpec::new("hoDate", K::Date, T::HoDate).required(),
                ColumnSpec::new("package", K::Text, T::Package),
                ColumnSpec::new("actDate", K::Date, T::ActDate),
                ColumnSpec::new("endDate", K::Date, T::EndDate),
                ColumnSpec::new("customer", K::Text, T::Company),
                ColumnSpec::new("address", K::Text, T::Address),
                ColumnSpec::new("name", K::Text, T::UserName),
                ColumnSpec::new("email", K::Email, T::UserEmail),
                ColumnSpec::new("tel", K::Tel, T::Tel),
                ColumnSpec::new("city", K::Text, T::City),
                ColumnSpec::new("code", K::Text, T::Code),
                ColumnSpec::new("accMail", K::Email, T::CredentialEmail),
                ColumnSpec::new("password", K::Text, T::Password),
                ColumnSpec::new("quota", K::Integer, T::Quota),
                ColumnSpec::new("userId", K::Integer, T::UserId),
            ],
            sample_rows: DEFAULT_SAMPLE_ROWS,
        }
    }

    /// 仅凭证导入
    pub fn credential_only() -> Self {
        use FieldKind as K;
        use FieldTarget as T;

        Self {
            intent: ImportIntent::CredentialOnly,
            columns: vec![
                ColumnSpec::new("id", K::Integer, T::CredentialId),
                ColumnSpec::new("email", K::Email, T::CredentialEmail).required(),
                ColumnSpec::new("password", K::Text, T::Password).required(),
                ColumnSpec::new("package", K::Text, T::Package),
                ColumnSpec::new("quota", K::Integer, T::Quota),
                ColumnSpec::new("code", K::Text, T::Code),
                ColumnSpec::new("userId", K::Integer, T::UserId),
                ColumnSpec::new("reseller", K::Text, T::Reseller),
                ColumnSpec::new("actDate", K::Date, T::ActDate),
                ColumnSpec::new("endDate", K::Date, T::EndDate),
            ],
            sample_rows: DEFAULT_SAMPLE_ROWS,
        }
    }

    pub fn with_sample_rows(mut self, sample_rows: usize) -> Self {
        self.sample_rows = sample_rows;
        self
    }

    pub fn required_columns(&self) -> impl Iterator<Item = &ColumnSpec> {
        self.columns.iter().filter(|c| c.required)
    }

    /// 列名查找（不区分大小写）
    pub fn column(&self, name: &str) -> Option<&ColumnSpec> {
        self.columns
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name))
    }

    pub fn is_expected(&self, name: &str) -> bool {
        self.column(name).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ledger_required_columns() {
        let config = SchemaConfig::ledger();
        let required: Vec<&str> = config.required_columns().map(|c| c.name.as_str()).collect();
        assert_eq!(required, vec!["date", "reseller", "hoDate"]);
    }

    #[test]
    fn test_credential_only_required_columns() {
        let config = SchemaConfig::for_intent(ImportIntent::CredentialOnly);
        let required: Vec<&str> = config.required_columns().map(|c| c.name.as_str()).collect();
        assert_eq!(required, vec!["email", "password"]);
    }

    #[test]
    fn test_email_target_depends_on_intent() {
        let ledger = SchemaConfig::ledger();
        let cred = SchemaConfig::credential_only();
        assert_eq!(ledger.column("email").map(|c| c.target), Some(FieldTarget::UserEmail));
        assert_eq!(
            cred.column("email").map(|c| c.target),
            Some(FieldTarget::CredentialEmail)
        );
        assert_eq!(
            ledger.column("ACCMAIL").map(|c| c.target),
            Some(FieldTarget::CredentialEmail)
        );
    }
}
