// ==========================================
// Mock 协作方 - 用于集成测试
// ==========================================
// 记录通知、慢通知、写入失败的仓储
// ==========================================

use async_trait::async_trait;
use license_ledger::domain::{Credential, ImportBatch, Package, Reseller, Sale, User};
use license_ledger::gateway::{NotificationSink, NotifyOutcome};
use license_ledger::repository::{
    LedgerRepository, RepositoryError, RepositoryResult, RowChangeOutcome, RowChangeSet,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

// ==========================================
// 通知
// ==========================================

/// 记录所有通知
#[derive(Default)]
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<(String, serde_json::Value)>>,
}

#[async_trait]
impl NotificationSink for RecordingNotifier {
    async fn notify(&self, channel: &str, payload: serde_json::Value) -> NotifyOutcome {
        self.sent
            .lock()
            .unwrap()
            .push((channel.to_string(), payload));
        NotifyOutcome::ok()
    }
}

impl RecordingNotifier {
    /// 等待后台通知送达，返回已记录的通知
    pub async fn wait_for(&self, count: usize) -> Vec<(String, serde_json::Value)> {
        for _ in 0..100 {
            {
                let sent = self.sent.lock().unwrap();
                if sent.len() >= count {
                    return sent.clone();
                }
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        self.sent.lock().unwrap().clone()
    }
}

/// 永远超时的通知
pub struct SlowNotifier {
    pub delay: Duration,
}

#[async_trait]
impl NotificationSink for SlowNotifier {
    async fn notify(&self, _channel: &str, _payload: serde_json::Value) -> NotifyOutcome {
        tokio::time::sleep(self.delay).await;
        NotifyOutcome::ok()
    }
}

/// 返回失败的通知
pub struct FailingNotifier;

#[async_trait]
impl NotificationSink for FailingNotifier {
    async fn notify(&self, _channel: &str, _payload: serde_json::Value) -> NotifyOutcome {
        NotifyOutcome::failed("channel unavailable")
    }
}

// ==========================================
// 仓储
// ==========================================

/// 行写入始终失败（连接错误），其余调用透传
pub struct FailingWriteRepository {
    inner: Arc<dyn LedgerRepository>,
    pub write_attempts: AtomicUsize,
}

impl FailingWriteRepository {
    pub fn new(inner: Arc<dyn LedgerRepository>) -> Self {
        Self {
            inner,
            write_attempts: AtomicUsize::new(0),
        }
    }

    pub fn attempts(&self) -> usize {
        self.write_attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LedgerRepository for FailingWriteRepository {
    async fn find_package_by_id(&self, id: i64) -> RepositoryResult<Option<Package>> {
        self.inner.find_package_by_id(id).await
    }

    async fn find_packages_by_name(&self, name: &str) -> RepositoryResult<Vec<Package>> {
        self.inner.find_packages_by_name(name).await
    }

    async fn list_packages(&self) -> RepositoryResult<Vec<Package>> {
        self.inner.list_packages().await
    }

    async fn insert_package(&self, name: &str) -> RepositoryResult<Package> {
        self.inner.insert_package(name).await
    }

    async fn find_reseller_by_id(&self, id: i64) -> RepositoryResult<Option<Reseller>> {
        self.inner.find_reseller_by_id(id).await
    }

    async fn insert_reseller(&self, name: &str, email: Option<&str>) -> RepositoryResult<Reseller> {
        self.inner.insert_reseller(name, email).await
    }

    async fn find_user_by_id(&self, id: i64) -> RepositoryResult<Option<User>> {
        self.inner.find_user_by_id(id).await
    }

    async fn insert_user(&self, name: &str, email: Option<&str>) -> RepositoryResult<User> {
        self.inner.insert_user(name, email).await
    }

    async fn find_credential_by_id(&self, id: i64) -> RepositoryResult<Option<Credential>> {
        self.inner.find_credential_by_id(id).await
    }

    async fn find_credential_by_email(&self, email: &str) -> RepositoryResult<Option<Credential>> {
        self.inner.find_credential_by_email(email).await
    }

    async fn count_credentials(&self) -> RepositoryResult<usize> {
        self.inner.count_credentials().await
    }

    async fn find_sale_by_credential(&self, credential_id: i64) -> RepositoryResult<Option<Sale>> {
        self.inner.find_sale_by_credential(credential_id).await
    }

    async fn list_sales_by_credential(&self, credential_id: i64) -> RepositoryResult<Vec<Sale>> {
        self.inner.list_sales_by_credential(credential_id).await
    }

    async fn count_sales(&self) -> RepositoryResult<usize> {
        self.inner.count_sales().await
    }

    async fn apply_row_changes(&self, _changes: RowChangeSet) -> RepositoryResult<RowChangeOutcome> {
        self.write_attempts.fetch_add(1, Ordering::SeqCst);
        Err(RepositoryError::DatabaseConnectionError(
            "disk I/O error".to_string(),
        ))
    }

    async fn insert_batch(&self, batch: &ImportBatch) -> RepositoryResult<()> {
        self.inner.insert_batch(batch).await
    }

    async fn get_recent_batches(&self, limit: usize) -> RepositoryResult<Vec<ImportBatch>> {
        self.inner.get_recent_batches(limit).await
    }
}
