// ==========================================
// 授权凭证管理后台 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use crate::config::import_config_trait::ImportConfigReader;
use crate::db::open_sqlite_connection;
use crate::importer::error::{ImportError, ImportResult};
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Arc, Mutex};

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    pub fn new(db_path: &str) -> ImportResult<Self> {
        let conn = open_sqlite_connection(db_path)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager（与导入仓储共用同一连接）
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    fn get_config_value(&self, key: &str) -> ImportResult<Option<String>> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| ImportError::InternalError(format!("锁获取失败: {}", e)))?;

        conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        )
        .optional()
        .map_err(|e| ImportError::ConfigReadError {
            key: key.to_string(),
            message: e.to_string(),
        })
    }

    fn get_config_or_default(&self, key: &str, default: &str) -> ImportResult<String> {
        Ok(self
            .get_config_value(key)?
            .unwrap_or_else(|| default.to_string()))
    }

    /// 读取数值配置，格式错误时告警并回退默认值
    fn get_parsed_or_default<T>(&self, key: &str, default: T) -> ImportResult<T>
    where
        T: std::str::FromStr + std::fmt::Display + Copy,
    {
        match self.get_config_value(key)? {
            None => Ok(default),
            Some(raw) => match raw.trim().parse::<T>() {
                Ok(v) => Ok(v),
                Err(_) => {
                    tracing::warn!(config_key = key, raw_value = %raw, default = %default, "配置值格式错误，使用默认值");
                    Ok(default)
                }
            },
        }
    }

    /// 写入 global 配置（UPSERT）
    pub fn set_global_config_value(&self, key: &str, value: &str) -> ImportResult<()> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| ImportError::InternalError(format!("锁获取失败: {}", e)))?;

        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value) VALUES ('global', ?1, ?2)
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2",
            params![key, value],
        )
        .map_err(|e| ImportError::ConfigReadError {
            key: key.to_string(),
            message: e.to_string(),
        })?;

        Ok(())
    }
}

// ==========================================
// ImportConfigReader Trait 实现
// ==========================================
#[async_trait]
impl ImportConfigReader for ConfigManager {
    async fn get_max_file_bytes(&self) -> ImportResult<usize> {
        self.get_parsed_or_default(config_keys::MAX_FILE_BYTES, defaults::MAX_FILE_BYTES)
    }

    async fn get_validation_sample_rows(&self) -> ImportResult<usize> {
        self.get_parsed_or_default(
            config_keys::VALIDATION_SAMPLE_ROWS,
            defaults::VALIDATION_SAMPLE_ROWS,
        )
    }

    async fn get_persistence_failure_limit(&self) -> ImportResult<usize> {
        let limit = self.get_parsed_or_default(
            config_keys::PERSISTENCE_FAILURE_LIMIT,
            defaults::PERSISTENCE_FAILURE_LIMIT,
        )?;
        Ok(limit.max(1))
    }

    async fn get_notify_timeout_ms(&self) -> ImportResult<u64> {
        self.get_parsed_or_default(config_keys::NOTIFY_TIMEOUT_MS, defaults::NOTIFY_TIMEOUT_MS)
    }

    async fn get_notify_channel(&self) -> ImportResult<String> {
        let value = self.get_config_or_default(config_keys::NOTIFY_CHANNEL, defaults::NOTIFY_CHANNEL)?;
        let trimmed = value.trim();
        if trimmed.is_empty() {
            Ok(defaults::NOTIFY_CHANNEL.to_string())
        } else {
            Ok(trimmed.to_string())
        }
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    pub const MAX_FILE_BYTES: &str = "import/max_file_bytes";
    pub const VALIDATION_SAMPLE_ROWS: &str = "import/validation_sample_rows";
    pub const PERSISTENCE_FAILURE_LIMIT: &str = "import/persistence_failure_limit";
    pub const NOTIFY_TIMEOUT_MS: &str = "import/notify_timeout_ms";
    pub const NOTIFY_CHANNEL: &str = "import/notify_channel";
}

// ==========================================
// 默认值
// ==========================================
pub mod defaults {
    pub const MAX_FILE_BYTES: usize = 10 * 1024 * 1024;
    pub const VALIDATION_SAMPLE_ROWS: usize = 5;
    pub const PERSISTENCE_FAILURE_LIMIT: usize = 3;
    pub const NOTIFY_TIMEOUT_MS: u64 = 2_000;
    pub const NOTIFY_CHANNEL: &str = "credential-import";
}
