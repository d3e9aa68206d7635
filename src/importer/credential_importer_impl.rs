// ==========================================
// 授权凭证管理后台 - 凭证导入器实现
// ==========================================
// 职责: 整合导入流程，从文件到数据库
// 流程: 权限 → 解析 → 结构校验 → 类型转换 → 引用解析 → 逐行落库 → 汇总 → 通知
// 红线: 行按源文件顺序单任务写入；结构错误时零写入
// ==========================================

use crate::config::{ImportConfigReader, SchemaConfig};
use crate::domain::import::{BatchResult, ImportBatch, RowErrorKind};
use crate::domain::row::ParsedSheet;
use crate::domain::types::ImportIntent;
use crate::gateway::{NotificationSink, PermissionChecker, ACTION_IMPORT, MODULE_CREDENTIALS};
use crate::importer::entity_resolver::EntityResolver;
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::file_parser::UniversalFileParser;
use crate::importer::importer_trait::{CredentialImporter, ImportRequest};
use crate::importer::reconciliation_writer::ReconciliationWriter;
use crate::importer::result_aggregator::ResultAggregator;
use crate::importer::schema_validator::SchemaValidator;
use crate::importer::type_normalizer::TypeNormalizer;
use crate::repository::LedgerRepository;
use async_trait::async_trait;
use chrono::Utc;
use serde_json::json;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

// ==========================================
// CredentialImporterImpl - 凭证导入器实现
// ==========================================
pub struct CredentialImporterImpl<C>
where
    C: ImportConfigReader,
{
    // 数据访问层
    repo: Arc<dyn LedgerRepository>,

    // 配置读取器
    config: C,

    // 外部协作方
    permissions: Arc<dyn PermissionChecker>,
    notifier: Arc<dyn NotificationSink>,
}

impl<C> CredentialImporterImpl<C>
where
    C: ImportConfigReader,
{
    pub fn new(
        repo: Arc<dyn LedgerRepository>,
        config: C,
        permissions: Arc<dyn PermissionChecker>,
        notifier: Arc<dyn NotificationSink>,
    ) -> Self {
        Self {
            repo,
            config,
            permissions,
            notifier,
        }
    }

    async fn ensure_permission(&self) -> ImportResult<()> {
        if self
            .permissions
            .check_permission(ACTION_IMPORT, MODULE_CREDENTIALS)
            .await
        {
            Ok(())
        } else {
            warn!(action = ACTION_IMPORT, module = MODULE_CREDENTIALS, "导入权限不足");
            Err(ImportError::PermissionDenied {
                action: ACTION_IMPORT.to_string(),
                module: MODULE_CREDENTIALS.to_string(),
            })
        }
    }

    /// 批次主流程（权限已检查）
    async fn run_batch(
        &self,
        sheet: ParsedSheet,
        intent: ImportIntent,
        actor: Option<&str>,
        file_name: Option<&str>,
    ) -> ImportResult<BatchResult> {
        let start_time = Instant::now();
        let batch_id = Uuid::new_v4().to_string();
        let total_rows = sheet.rows.len();
        info!(batch_id = %batch_id, intent = %intent, total_rows, "开始导入凭证台账");

        // === 步骤 1: 结构校验 ===
        let sample_rows = self.config.get_validation_sample_rows().await?;
        let schema = SchemaConfig::for_intent(intent).with_sample_rows(sample_rows);
        let validator = SchemaValidator::new(schema.clone());
        let mut report = validator.validate(&sheet);

        if !report.extra_columns.is_empty() {
            debug!(extra = ?report.extra_columns, "忽略未定义列");
        }

        let mut aggregator = ResultAggregator::new(batch_id.clone(), intent, total_rows);

        if let Err(e) = SchemaValidator::ensure_structure(&report) {
            warn!(batch_id = %batch_id, error = %e, "结构校验失败，整批拒绝");
            aggregator.record_skipped(total_rows);
            aggregator.set_fatal(e.to_string());
            let result = aggregator.finish(report, start_time.elapsed().as_millis() as u64);
            self.finalize(&result, actor, file_name).await;
            return Ok(result);
        }

        // === 步骤 2: 逐行处理 ===
        let normalizer = TypeNormalizer::new(schema);
        let resolver = EntityResolver::load(self.repo.clone()).await?;
        let writer = ReconciliationWriter::new(self.repo.clone());
        let failure_limit = self.config.get_persistence_failure_limit().await?;
        let mut consecutive_persistence_failures = 0usize;

        for (idx, row) in sheet.rows.iter().enumerate() {
            let row_number = row.row_number();

            if report.has_row_error(row_number) {
                let message = report
                    .errors_for_row(row_number)
                    .iter()
                    .map(|e| format!("{}: {}", e.field, e.message))
                    .collect::<Vec<_>>()
                    .join("; ");
                aggregator.record_failure_message(row_number, RowErrorKind::RowValidation, message);
                consecutive_persistence_failures = 0;
                continue;
            }

            let record = match normalizer.normalize(row) {
                Ok(record) => record,
                Err(errors) => {
                    let message = errors
                        .iter()
                        .map(|e| format!("{}: {}", e.field, e.message))
                        .collect::<Vec<_>>()
                        .join("; ");
                    report.extend_row_errors(errors);
                    aggregator.record_failure_message(
                        row_number,
                        RowErrorKind::RowValidation,
                        message,
                    );
                    consecutive_persistence_failures = 0;
                    continue;
                }
            };

            let outcome = match resolver.resolve(&record).await {
                Ok(refs) => writer.write(&record, &refs).await,
                Err(e) => Err(e),
            };

            match outcome {
                Ok(outcome) => {
                    aggregator.record_success(row_number, &outcome);
                    consecutive_persistence_failures = 0;
                }
                Err(e) => {
                    warn!(batch_id = %batch_id, row = row_number, error = %e, "行导入失败");
                    aggregator.record_failure(row_number, &e);

                    if e.is_persistence() {
                        consecutive_persistence_failures += 1;
                    } else {
                        consecutive_persistence_failures = 0;
                    }

                    if consecutive_persistence_failures >= failure_limit {
                        let remaining = total_rows - idx - 1;
                        error!(
                            batch_id = %batch_id,
                            consecutive = consecutive_persistence_failures,
                            remaining,
                            "连续持久化失败，中止批次"
                        );
                        aggregator.record_skipped(remaining);
                        aggregator.set_fatal(format!(
                            "连续 {} 行持久化失败，批次中止，剩余 {} 行未处理: {}",
                            consecutive_persistence_failures, remaining, e
                        ));
                        break;
                    }
                }
            }
        }

        // === 步骤 3: 汇总 ===
        let result = aggregator.finish(report, start_time.elapsed().as_millis() as u64);
        info!(
            batch_id = %result.batch_id,
            succeeded = result.counts.succeeded,
            failed = result.counts.failed,
            skipped = result.counts.skipped,
            elapsed_ms = result.elapsed_ms,
            "凭证导入完成"
        );

        self.finalize(&result, actor, file_name).await;
        Ok(result)
    }

    /// 记录批次并发送通知（均不影响批次结果）
    async fn finalize(&self, result: &BatchResult, actor: Option<&str>, file_name: Option<&str>) {
        let batch = ImportBatch {
            batch_id: result.batch_id.clone(),
            file_name: file_name.map(str::to_string),
            intent: result.intent,
            total_rows: result.counts.total as i64,
            succeeded_rows: result.counts.succeeded as i64,
            failed_rows: result.counts.failed as i64,
            skipped_rows: result.counts.skipped as i64,
            imported_by: actor.map(str::to_string),
            imported_at: Utc::now(),
            elapsed_ms: result.elapsed_ms as i64,
            report_json: serde_json::to_string(result).ok(),
        };

        if let Err(e) = self.repo.insert_batch(&batch).await {
            error!(batch_id = %batch.batch_id, error = %e, "批次记录写入失败");
        }

        self.notify(result, actor, file_name).await;
    }

    async fn notify(&self, result: &BatchResult, actor: Option<&str>, file_name: Option<&str>) {
        let channel = match self.config.get_notify_channel().await {
            Ok(channel) => channel,
            Err(e) => {
                warn!(error = %e, "读取通知通道失败，跳过通知");
                return;
            }
        };
        let timeout_ms = match self.config.get_notify_timeout_ms().await {
            Ok(ms) => ms,
            Err(e) => {
                warn!(error = %e, "读取通知超时失败，跳过通知");
                return;
            }
        };

        let payload = json!({
            "batch_id": result.batch_id,
            "intent": result.intent,
            "success": result.success,
            "counts": result.counts,
            "fatal_error": result.fatal_error,
            "file_name": file_name,
            "actor": actor,
        });

        // 后台发送，批次结果不等待通知
        let notifier = Arc::clone(&self.notifier);
        let batch_id = result.batch_id.clone();
        tokio::spawn(async move {
            match tokio::time::timeout(
                Duration::from_millis(timeout_ms),
                notifier.notify(&channel, payload),
            )
            .await
            {
                Ok(outcome) if outcome.success => {
                    debug!(batch_id = %batch_id, channel = %channel, "通知已发送");
                }
                Ok(outcome) => {
                    warn!(
                        batch_id = %batch_id,
                        error = outcome.error.as_deref().unwrap_or("unknown"),
                        "通知发送失败"
                    );
                }
                Err(_) => {
                    warn!(batch_id = %batch_id, timeout_ms, "通知发送超时");
                }
            }
        });
    }
}

#[async_trait]
impl<C> CredentialImporter for CredentialImporterImpl<C>
where
    C: ImportConfigReader + Send + Sync,
{
    #[instrument(skip(self, request), fields(file_name = %request.file_name, intent = %request.intent))]
    async fn import_file(&self, request: ImportRequest) -> ImportResult<BatchResult> {
        self.ensure_permission().await?;

        let max_file_bytes = self.config.get_max_file_bytes().await?;
        let parser = UniversalFileParser::new(max_file_bytes);
        let sheet = parser
            .parse(&request.bytes, &request.file_name, request.mime_type.as_deref())
            .map_err(|e| {
                error!(error = %e, "文件解析失败");
                e
            })?;

        debug!(rows = sheet.rows.len(), columns = sheet.headers.len(), "文件解析完成");

        self.run_batch(
            sheet,
            request.intent,
            request.actor.as_deref(),
            Some(&request.file_name),
        )
        .await
    }

    #[instrument(skip(self, sheet), fields(rows = sheet.rows.len()))]
    async fn import_rows(
        &self,
        sheet: ParsedSheet,
        intent: ImportIntent,
        actor: Option<&str>,
        file_name: Option<&str>,
    ) -> ImportResult<BatchResult> {
        self.ensure_permission().await?;
        self.run_batch(sheet, intent, actor, file_name).await
    }
}
