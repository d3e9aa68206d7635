// ==========================================
// 授权凭证管理后台 - 导入层
// ==========================================
// 职责: 台账/凭证文件批量导入并与已有数据对账
// 支持: CSV, Excel/ODS（第一个工作表）
// ==========================================

// 模块声明
pub mod credential_importer_impl;
pub mod entity_resolver;
pub mod error;
pub mod file_parser;
pub mod importer_trait;
pub mod reconciliation_writer;
pub mod result_aggregator;
pub mod schema_validator;
pub mod type_normalizer;

// 重导出核心类型
pub use credential_importer_impl::CredentialImporterImpl;
pub use entity_resolver::{
    EntityResolver, IdMatcher, ScanNameMatcher, StoreNameMatcher, SubstringMatcher,
};
pub use error::{ImportError, ImportResult};
pub use file_parser::{CsvParser, ExcelParser, UniversalFileParser};
pub use reconciliation_writer::ReconciliationWriter;
pub use result_aggregator::ResultAggregator;
pub use schema_validator::SchemaValidator;
pub use type_normalizer::TypeNormalizer;

// 重导出 Trait 接口
pub use importer_trait::{
    CredentialImporter, FileParser, ImportRequest, MatchContext, PackageMatcher,
};
