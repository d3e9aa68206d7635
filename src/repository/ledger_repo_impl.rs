// ==========================================
// 授权凭证管理后台 - 台账 Repository 实现
// ==========================================
// 职责: 实现台账数据访问（使用 rusqlite）
// 红线: Repository 不含业务规则，只做数据 CRUD
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::entity::{Credential, NewCredential, Package, Reseller, Sale, User};
use crate::domain::import::ImportBatch;
use crate::domain::types::ImportIntent;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::ledger_repo::{
    CredentialChange, LedgerRepository, RowChangeOutcome, RowChangeSet, SaleChange,
};
use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction};
use std::sync::{Arc, Mutex, MutexGuard};

const CREDENTIAL_COLUMNS: &str = "id, email, password, package_id, quota, code, user_id, \
     act_date, end_date, created_at, updated_at";

const SALE_COLUMNS: &str =
    "id, reseller_id, credentials_id, sale_date, ho_date, msp_create, created_at, updated_at";

const USER_COLUMNS: &str = "id, name, email, company, tel, address, city, created_at, updated_at";

// ==========================================
// 行映射
// ==========================================

fn map_package(row: &Row) -> rusqlite::Result<Package> {
    Ok(Package {
        id: row.get("id")?,
        name: row.get("name")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

fn map_reseller(row: &Row) -> rusqlite::Result<Reseller> {
    Ok(Reseller {
        id: row.get("id")?,
        name: row.get("name")?,
        email: row.get("email")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

fn map_user(row: &Row) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get("id")?,
        name: row.get("name")?,
        email: row.get("email")?,
        company: row.get("company")?,
        tel: row.get("tel")?,
        address: row.get("address")?,
        city: row.get("city")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

fn map_credential(row: &Row) -> rusqlite::Result<Credential> {
    Ok(Credential {
        id: row.get("id")?,
        email: row.get("email")?,
        password: row.get("password")?,
        package_id: row.get("package_id")?,
        quota: row.get("quota")?,
        code: row.get("code")?,
        user_id: row.get("user_id")?,
        act_date: row.get("act_date")?,
        end_date: row.get("end_date")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

fn map_sale(row: &Row) -> rusqlite::Result<Sale> {
    Ok(Sale {
        id: row.get("id")?,
        reseller_id: row.get("reseller_id")?,
        credentials_id: row.get("credentials_id")?,
        sale_date: row.get("sale_date")?,
        ho_date: row.get("ho_date")?,
        msp_create: row.get("msp_create")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

fn map_batch(row: &Row) -> rusqlite::Result<ImportBatch> {
    let intent_raw: String = row.get("intent")?;
    let intent = intent_raw.parse::<ImportIntent>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(
            2,
            rusqlite::types::Type::Text,
            Box::<dyn std::error::Error + Send + Sync>::from(e),
        )
    })?;

    Ok(ImportBatch {
        batch_id: row.get("batch_id")?,
        file_name: row.get("file_name")?,
        intent,
        total_rows: row.get("total_rows")?,
        succeeded_rows: row.get("succeeded_rows")?,
        failed_rows: row.get("failed_rows")?,
        skipped_rows: row.get("skipped_rows")?,
        imported_by: row.get("imported_by")?,
        imported_at: row.get("imported_at")?,
        elapsed_ms: row.get("elapsed_ms")?,
        report_json: row.get("report_json")?,
    })
}

// ==========================================
// LedgerRepositoryImpl
// ==========================================
pub struct LedgerRepositoryImpl {
    conn: Arc<Mutex<Connection>>,
}

impl LedgerRepositoryImpl {
    /// 创建新的 Repository 实例（独立连接）
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建（批次内共用同一连接）
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn lock(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(format!("锁获取失败: {}", e)))
    }

    /// 在事务中写入凭证，返回 (凭证 id, 是否新建)
    fn write_credential_tx(
        tx: &Transaction,
        change: &CredentialChange,
    ) -> RepositoryResult<(i64, bool)> {
        match change {
            CredentialChange::Insert(new) => {
                Self::insert_credential_tx(tx, new)?;
                Ok((tx.last_insert_rowid(), true))
            }
            CredentialChange::Update(credential) => {
                let affected = tx.execute(
                    r#"
                    UPDATE credential SET
                        email = ?2, password = ?3, package_id = ?4, quota = ?5, code = ?6,
                        user_id = ?7, act_date = ?8, end_date = ?9, updated_at = ?10
                    WHERE id = ?1
                    "#,
                    params![
                        credential.id,
                        credential.email,
                        credential.password,
                        credential.package_id,
                        credential.quota,
                        credential.code,
                        credential.user_id,
                        credential.act_date,
                        credential.end_date,
                        credential.updated_at,
                    ],
                )?;

                if affected == 0 {
                    return Err(RepositoryError::NotFound {
                        entity: "credential".to_string(),
                        id: credential.id,
                    });
                }
                Ok((credential.id, false))
            }
        }
    }

    fn insert_credential_tx(tx: &Transaction, new: &NewCredential) -> RepositoryResult<()> {
        tx.execute(
            r#"
            INSERT INTO credential (
                email, password, package_id, quota, code, user_id,
                act_date, end_date, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            "#,
            params![
                new.email,
                new.password,
                new.package_id,
                new.quota,
                new.code,
                new.user_id,
                new.act_date,
                new.end_date,
                new.created_at,
                new.updated_at,
            ],
        )?;
        Ok(())
    }

    fn update_user_tx(tx: &Transaction, user: &User) -> RepositoryResult<()> {
        let affected = tx.execute(
            r#"
            UPDATE user SET
                name = ?2, email = ?3, company = ?4, tel = ?5, address = ?6, city = ?7,
                updated_at = ?8
            WHERE id = ?1
            "#,
            params![
                user.id,
                user.name,
                user.email,
                user.company,
                user.tel,
                user.address,
                user.city,
                user.updated_at,
            ],
        )?;

        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "user".to_string(),
                id: user.id,
            });
        }
        Ok(())
    }

    /// 在事务中写入销售关联，返回 (sale id, 是否新建)
    fn write_sale_tx(
        tx: &Transaction,
        credential_id: i64,
        change: &SaleChange,
    ) -> RepositoryResult<(i64, bool)> {
        match change {
            SaleChange::Insert {
                reseller_id,
                sale_date,
                ho_date,
                msp_create,
                created_at,
            } => {
                tx.execute(
                    r#"
                    INSERT INTO sale (
                        reseller_id, credentials_id, sale_date, ho_date, msp_create,
                        created_at, updated_at
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)
                    "#,
                    params![reseller_id, credential_id, sale_date, ho_date, msp_create, created_at],
                )?;
                Ok((tx.last_insert_rowid(), true))
            }
            SaleChange::Update(sale) => {
                let affected = tx.execute(
                    r#"
                    UPDATE sale SET
                        reseller_id = ?2, sale_date = ?3, ho_date = ?4, msp_create = ?5,
                        updated_at = ?6
                    WHERE id = ?1 AND credentials_id = ?7
                    "#,
                    params![
                        sale.id,
                        sale.reseller_id,
                        sale.sale_date,
                        sale.ho_date,
                        sale.msp_create,
                        sale.updated_at,
                        credential_id,
                    ],
                )?;

                if affected == 0 {
                    return Err(RepositoryError::NotFound {
                        entity: "sale".to_string(),
                        id: sale.id,
                    });
                }
                Ok((sale.id, false))
            }
        }
    }
}

#[async_trait]
impl LedgerRepository for LedgerRepositoryImpl {
    // ===== 套餐 =====

    async fn find_package_by_id(&self, id: i64) -> RepositoryResult<Option<Package>> {
        let conn = self.lock()?;
        let package = conn
            .query_row(
                "SELECT id, name, created_at, updated_at FROM package WHERE id = ?1",
                params![id],
                map_package,
            )
            .optional()?;
        Ok(package)
    }

    async fn find_packages_by_name(&self, name: &str) -> RepositoryResult<Vec<Package>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT id, name, created_at, updated_at FROM package \
             WHERE lower(trim(name)) = lower(?1) ORDER BY id",
        )?;
        let packages = stmt
            .query_map(params![name], map_package)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(packages)
    }

    async fn list_packages(&self) -> RepositoryResult<Vec<Package>> {
        let conn = self.lock()?;
        let mut stmt =
            conn.prepare("SELECT id, name, created_at, updated_at FROM package ORDER BY id")?;
        let packages = stmt
            .query_map([], map_package)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(packages)
    }

    async fn insert_package(&self, name: &str) -> RepositoryResult<Package> {
        let conn = self.lock()?;
        let now = Utc::now();
        conn.execute(
            "INSERT INTO package (name, created_at, updated_at) VALUES (?1, ?2, ?2)",
            params![name, now],
        )?;
        Ok(Package {
            id: conn.last_insert_rowid(),
            name: name.to_string(),
            created_at: now,
            updated_at: now,
        })
    }

    // ===== 经销商 =====

    async fn find_reseller_by_id(&self, id: i64) -> RepositoryResult<Option<Reseller>> {
        let conn = self.lock()?;
        let reseller = conn
            .query_row(
                "SELECT id, name, email, created_at, updated_at FROM reseller WHERE id = ?1",
                params![id],
                map_reseller,
            )
            .optional()?;
        Ok(reseller)
    }

    async fn insert_reseller(&self, name: &str, email: Option<&str>) -> RepositoryResult<Reseller> {
        let conn = self.lock()?;
        let now = Utc::now();
        conn.execute(
            "INSERT INTO reseller (name, email, created_at, updated_at) VALUES (?1, ?2, ?3, ?3)",
            params![name, email, now],
        )?;
        Ok(Reseller {
            id: conn.last_insert_rowid(),
            name: name.to_string(),
            email: email.map(str::to_string),
            created_at: now,
            updated_at: now,
        })
    }

    // ===== 客户 =====

    async fn find_user_by_id(&self, id: i64) -> RepositoryResult<Option<User>> {
        let conn = self.lock()?;
        let sql = format!("SELECT {} FROM user WHERE id = ?1", USER_COLUMNS);
        let user = conn.query_row(&sql, params![id], map_user).optional()?;
        Ok(user)
    }

    async fn insert_user(&self, name: &str, email: Option<&str>) -> RepositoryResult<User> {
        let conn = self.lock()?;
        let now = Utc::now();
        conn.execute(
            "INSERT INTO user (name, email, created_at, updated_at) VALUES (?1, ?2, ?3, ?3)",
            params![name, email, now],
        )?;
        Ok(User {
            id: conn.last_insert_rowid(),
            name: Some(name.to_string()),
            email: email.map(str::to_string),
            company: None,
            tel: None,
            address: None,
            city: None,
            created_at: now,
            updated_at: now,
        })
    }

    // ===== 凭证 =====

    async fn find_credential_by_id(&self, id: i64) -> RepositoryResult<Option<Credential>> {
        let conn = self.lock()?;
        let sql = format!("SELECT {} FROM credential WHERE id = ?1", CREDENTIAL_COLUMNS);
        let credential = conn.query_row(&sql, params![id], map_credential).optional()?;
        Ok(credential)
    }

    async fn find_credential_by_email(&self, email: &str) -> RepositoryResult<Option<Credential>> {
        let conn = self.lock()?;
        let sql = format!(
            "SELECT {} FROM credential WHERE email = ?1 COLLATE NOCASE",
            CREDENTIAL_COLUMNS
        );
        let credential = conn
            .query_row(&sql, params![email], map_credential)
            .optional()?;
        Ok(credential)
    }

    async fn count_credentials(&self) -> RepositoryResult<usize> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM credential", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    // ===== 销售关联 =====

    async fn find_sale_by_credential(&self, credential_id: i64) -> RepositoryResult<Option<Sale>> {
        let conn = self.lock()?;
        let sql = format!(
            "SELECT {} FROM sale WHERE credentials_id = ?1 ORDER BY id LIMIT 1",
            SALE_COLUMNS
        );
        let sale = conn
            .query_row(&sql, params![credential_id], map_sale)
            .optional()?;
        Ok(sale)
    }

    async fn list_sales_by_credential(&self, credential_id: i64) -> RepositoryResult<Vec<Sale>> {
        let conn = self.lock()?;
        let sql = format!(
            "SELECT {} FROM sale WHERE credentials_id = ?1 ORDER BY id",
            SALE_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let sales = stmt
            .query_map(params![credential_id], map_sale)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(sales)
    }

    async fn count_sales(&self) -> RepositoryResult<usize> {
        let conn = self.lock()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM sale", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    // ===== 行写入（事务化）=====

    async fn apply_row_changes(&self, changes: RowChangeSet) -> RepositoryResult<RowChangeOutcome> {
        let conn = self.lock()?;
        let tx = conn
            .unchecked_transaction()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        // 客户先于凭证写入（凭证 user_id 外键）
        let user_updated = match &changes.user {
            Some(user) => {
                Self::update_user_tx(&tx, user)?;
                true
            }
            None => false,
        };

        let (credential_id, credential_created) =
            Self::write_credential_tx(&tx, &changes.credential)?;

        let (sale_id, sale_created) = match &changes.sale {
            Some(sale) => {
                let (id, created) = Self::write_sale_tx(&tx, credential_id, sale)?;
                (Some(id), created)
            }
            None => (None, false),
        };

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        Ok(RowChangeOutcome {
            credential_id,
            credential_created,
            user_updated,
            sale_id,
            sale_created,
        })
    }

    // ===== 批次管理 =====

    async fn insert_batch(&self, batch: &ImportBatch) -> RepositoryResult<()> {
        let conn = self.lock()?;
        conn.execute(
            r#"
            INSERT INTO import_batch (
                batch_id, file_name, intent, total_rows, succeeded_rows, failed_rows,
                skipped_rows, imported_by, imported_at, elapsed_ms, report_json
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
            params![
                batch.batch_id,
                batch.file_name,
                batch.intent.as_str(),
                batch.total_rows,
                batch.succeeded_rows,
                batch.failed_rows,
                batch.skipped_rows,
                batch.imported_by,
                batch.imported_at,
                batch.elapsed_ms,
                batch.report_json,
            ],
        )?;
        Ok(())
    }

    async fn get_recent_batches(&self, limit: usize) -> RepositoryResult<Vec<ImportBatch>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT batch_id, file_name, intent, total_rows, succeeded_rows, failed_rows,
                   skipped_rows, imported_by, imported_at, elapsed_ms, report_json
            FROM import_batch
            ORDER BY imported_at DESC
            LIMIT ?1
            "#,
        )?;
        let batches = stmt
            .query_map(params![limit as i64], map_batch)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(batches)
    }
}
