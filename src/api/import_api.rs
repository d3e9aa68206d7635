// ==========================================
// 凭证导入API
// ==========================================
// 职责: 封装台账/凭证导入与批次查询
// 约束: 每次调用获取一个批次连接，调用返回时释放
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::config::ConfigManager;
use crate::db::BatchConnection;
use crate::domain::import::{BatchResult, ImportBatch};
use crate::domain::types::ImportIntent;
use crate::gateway::{NotificationSink, PermissionChecker, TracingNotifier};
use crate::importer::{CredentialImporter, CredentialImporterImpl, ImportRequest};
use crate::repository::{LedgerRepository, LedgerRepositoryImpl};
use std::sync::Arc;
use tracing::info;

/// 批次列表上限
const MAX_BATCH_LIST_LIMIT: usize = 100;

/// 导入API
pub struct ImportApi {
    db_path: String,
    permissions: Arc<dyn PermissionChecker>,
    notifier: Arc<dyn NotificationSink>,
}

impl ImportApi {
    /// 创建新的ImportApi实例（通知写入日志）
    pub fn new(db_path: String, permissions: Arc<dyn PermissionChecker>) -> Self {
        Self {
            db_path,
            permissions,
            notifier: Arc::new(TracingNotifier),
        }
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn NotificationSink>) -> Self {
        self.notifier = notifier;
        self
    }

    fn open_connection(&self) -> ApiResult<BatchConnection> {
        BatchConnection::open(&self.db_path)
            .map_err(|e| ApiError::DatabaseConnectionError(format!("打开数据库失败: {}", e)))
    }

    /// 导入凭证文件
    ///
    /// # 参数
    /// - bytes: 文件内容
    /// - file_name: 文件名（用于判定格式）
    /// - mime_type: MIME 类型（可选）
    /// - intent: 导入意图（台账 / 仅凭证）
    /// - actor: 操作人（可选）
    ///
    /// # 返回
    /// - Ok(BatchResult): 批次结果（结构校验失败时 success=false 且零写入）
    /// - Err(ApiError): 无权限、格式不支持、文件过大、解析失败
    pub async fn import_credentials(
        &self,
        bytes: Vec<u8>,
        file_name: &str,
        mime_type: Option<&str>,
        intent: ImportIntent,
        actor: Option<&str>,
    ) -> ApiResult<BatchResult> {
        let batch_conn = self.open_connection()?;
        let handle = batch_conn.handle();

        let importer = CredentialImporterImpl::new(
            Arc::new(LedgerRepositoryImpl::from_connection(handle.clone())),
            ConfigManager::from_connection(handle),
            self.permissions.clone(),
            self.notifier.clone(),
        );

        let request = ImportRequest {
            bytes,
            file_name: file_name.to_string(),
            mime_type: mime_type.map(str::to_string),
            intent,
            actor: actor.map(str::to_string),
        };

        let result = importer.import_file(request).await?;
        info!(
            batch_id = %result.batch_id,
            success = result.success,
            "导入API调用完成"
        );
        Ok(result)
    }

    /// 最近的导入批次（按导入时间倒序）
    pub async fn list_recent_batches(&self, limit: usize) -> ApiResult<Vec<ImportBatch>> {
        if limit == 0 {
            return Err(ApiError::InvalidInput("limit 必须大于 0".to_string()));
        }

        let batch_conn = self.open_connection()?;
        let repo = LedgerRepositoryImpl::from_connection(batch_conn.handle());
        Ok(repo
            .get_recent_batches(limit.min(MAX_BATCH_LIST_LIMIT))
            .await?)
    }
}
