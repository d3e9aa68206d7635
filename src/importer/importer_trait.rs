// ==========================================
// 授权凭证管理后台 - 凭证导入 Trait
// ==========================================
// 职责: 定义导入管道各阶段接口（不包含实现）
// 流程: 解析 → 结构校验 → 类型转换 → 引用解析 → 落库 → 汇总
// ==========================================

use crate::domain::entity::Package;
use crate::domain::import::BatchResult;
use crate::domain::row::ParsedSheet;
use crate::domain::types::ImportIntent;
use crate::importer::error::ImportResult;
use crate::repository::LedgerRepository;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

// ==========================================
// ImportRequest - 文件导入请求
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportRequest {
    #[serde(skip)]
    pub bytes: Vec<u8>,
    pub file_name: String,
    pub mime_type: Option<String>,
    pub intent: ImportIntent,
    pub actor: Option<String>, // 操作人（写入批次记录）
}

// ==========================================
// CredentialImporter Trait
// ==========================================
// 实现者: CredentialImporterImpl
#[async_trait]
pub trait CredentialImporter: Send + Sync {
    /// 从原始文件字节导入
    ///
    /// # 返回
    /// - Ok(BatchResult): 批次结果（含逐行明细，可能部分成功）
    /// - Err: 批次致命错误（无权限、格式不支持、文件过大、解析失败）
    async fn import_file(&self, request: ImportRequest) -> ImportResult<BatchResult>;

    /// 从已解析的行导入
    ///
    /// # 说明
    /// - 缺少必填列时整批拒绝，返回 success=false 且不写入任何行
    async fn import_rows(
        &self,
        sheet: ParsedSheet,
        intent: ImportIntent,
        actor: Option<&str>,
        file_name: Option<&str>,
    ) -> ImportResult<BatchResult>;
}

// ==========================================
// FileParser Trait
// ==========================================
// 实现者: CsvParser, ExcelParser
pub trait FileParser: Send + Sync {
    /// 解析文件字节为表头 + 原始行（全空行已丢弃）
    fn parse_bytes(&self, bytes: &[u8]) -> ImportResult<ParsedSheet>;
}

// ==========================================
// PackageMatcher Trait
// ==========================================
// 套餐引用解析策略，EntityResolver 按顺序尝试，首个命中即返回
pub struct MatchContext<'a> {
    pub repo: &'a dyn LedgerRepository,
    pub catalog: &'a [Package], // 本批次套餐快照（按 id 升序）
}

#[async_trait]
pub trait PackageMatcher: Send + Sync {
    /// 策略名（日志用）
    fn name(&self) -> &'static str;

    /// 尝试匹配，未命中返回 Ok(None)
    async fn try_match(&self, token: &str, ctx: &MatchContext<'_>) -> ImportResult<Option<i64>>;
}
