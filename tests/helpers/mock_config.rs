// ==========================================
// Mock 配置实现 - 用于集成测试
// ==========================================

use async_trait::async_trait;
use license_ledger::config::{defaults, ImportConfigReader};
use license_ledger::importer::ImportResult;

/// Mock 配置结构
#[derive(Debug, Clone)]
pub struct MockConfig {
    pub max_file_bytes: usize,
    pub sample_rows: usize,
    pub persistence_failure_limit: usize,
    pub notify_timeout_ms: u64,
    pub notify_channel: String,
}

impl MockConfig {
    /// 创建默认配置
    pub fn default() -> Self {
        Self {
            max_file_bytes: defaults::MAX_FILE_BYTES,
            sample_rows: defaults::VALIDATION_SAMPLE_ROWS,
            persistence_failure_limit: defaults::PERSISTENCE_FAILURE_LIMIT,
            notify_timeout_ms: defaults::NOTIFY_TIMEOUT_MS,
            notify_channel: defaults::NOTIFY_CHANNEL.to_string(),
        }
    }

    pub fn with_failure_limit(limit: usize) -> Self {
        let mut config = Self::default();
        config.persistence_failure_limit = limit;
        config
    }

    pub fn with_notify_timeout(ms: u64) -> Self {
        let mut config = Self::default();
        config.notify_timeout_ms = ms;
        config
    }
}

#[async_trait]
impl ImportConfigReader for MockConfig {
    async fn get_max_file_bytes(&self) -> ImportResult<usize> {
        Ok(self.max_file_bytes)
    }

    async fn get_validation_sample_rows(&self) -> ImportResult<usize> {
        Ok(self.sample_rows)
    }

    async fn get_persistence_failure_limit(&self) -> ImportResult<usize> {
        Ok(self.persistence_failure_limit)
    }

    async fn get_notify_timeout_ms(&self) -> ImportResult<u64> {
        Ok(self.notify_timeout_ms)
    }

    async fn get_notify_channel(&self) -> ImportResult<String> {
        Ok(self.notify_channel.clone())
    }
}
