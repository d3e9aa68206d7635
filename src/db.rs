// ==========================================
// 授权凭证管理后台 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为（外键、busy_timeout）
// - 提供幂等建表，供导入管道与测试共用
// ==========================================

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::debug;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 当前代码所期望的 schema_version
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：
/// - foreign_keys 需要“每个连接”单独开启
/// - busy_timeout 需要“每个连接”单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 建表（幂等）
///
/// 唯一约束是并发导入下的最后防线:
/// - credential.email（不区分大小写）
/// - sale(reseller_id, credentials_id)
/// - sale(credentials_id)：一个凭证最多一条销售关联
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS config_kv (
            scope_id TEXT NOT NULL DEFAULT 'global',
            key TEXT NOT NULL,
            value TEXT NOT NULL,
            PRIMARY KEY (scope_id, key)
        );

        CREATE TABLE IF NOT EXISTS package (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS reseller (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            email TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS user (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT,
            email TEXT,
            company TEXT,
            tel INTEGER,
            address TEXT,
            city TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS credential (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            email TEXT NOT NULL UNIQUE COLLATE NOCASE,
            password TEXT NOT NULL,
            package_id INTEGER NOT NULL REFERENCES package(id),
            quota INTEGER,
            code TEXT,
            user_id INTEGER REFERENCES user(id),
            act_date TEXT,
            end_date TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS sale (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            reseller_id INTEGER NOT NULL REFERENCES reseller(id),
            credentials_id INTEGER NOT NULL UNIQUE REFERENCES credential(id),
            sale_date TEXT,
            ho_date TEXT,
            msp_create TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            UNIQUE (reseller_id, credentials_id)
        );

        CREATE TABLE IF NOT EXISTS import_batch (
            batch_id TEXT PRIMARY KEY,
            file_name TEXT,
            intent TEXT NOT NULL,
            total_rows INTEGER NOT NULL,
            succeeded_rows INTEGER NOT NULL,
            failed_rows INTEGER NOT NULL,
            skipped_rows INTEGER NOT NULL,
            imported_by TEXT,
            imported_at TEXT NOT NULL,
            elapsed_ms INTEGER NOT NULL,
            report_json TEXT
        );

        CREATE INDEX IF NOT EXISTS idx_credential_user ON credential(user_id);
        CREATE INDEX IF NOT EXISTS idx_sale_reseller ON sale(reseller_id);
        "#,
    )?;

    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        [CURRENT_SCHEMA_VERSION],
    )?;

    Ok(())
}

/// 读取 schema_version（若表不存在则返回 None）
pub fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    let has_table: bool = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version' LIMIT 1",
            [],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    if !has_table {
        return Ok(None);
    }

    let v: Option<i64> =
        conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(v)
}

// ==========================================
// BatchConnection - 批次连接
// ==========================================
// 一次导入调用持有一个连接，仓储与配置读取共用
// 调用返回时随 Drop 释放，且只释放一次
pub struct BatchConnection {
    conn: Arc<Mutex<Connection>>,
    db_path: String,
}

impl BatchConnection {
    pub fn open(db_path: &str) -> rusqlite::Result<Self> {
        let conn = open_sqlite_connection(db_path)?;
        init_schema(&conn)?;
        debug!(db_path = %db_path, "获取批次连接");
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            db_path: db_path.to_string(),
        })
    }

    pub fn handle(&self) -> Arc<Mutex<Connection>> {
        self.conn.clone()
    }
}

impl Drop for BatchConnection {
    fn drop(&mut self) {
        debug!(db_path = %self.db_path, "释放批次连接");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_schema_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        configure_sqlite_connection(&conn).unwrap();
        assert_eq!(read_schema_version(&conn).unwrap(), None);

        init_schema(&conn).unwrap();
        init_schema(&conn).unwrap();

        assert_eq!(read_schema_version(&conn).unwrap(), Some(CURRENT_SCHEMA_VERSION));
    }

    #[test]
    fn test_batch_connection_shared_handle() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ledger.db");
        let batch = BatchConnection::open(path.to_str().unwrap()).unwrap();

        let a = batch.handle();
        let b = batch.handle();
        assert!(Arc::ptr_eq(&a, &b));

        let version = read_schema_version(&a.lock().unwrap()).unwrap();
        assert_eq!(version, Some(CURRENT_SCHEMA_VERSION));
    }
}
