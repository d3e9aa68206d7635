// ==========================================
// 授权凭证管理后台 - 台账 Repository Trait
// ==========================================
// 职责: 定义凭证/客户/经销商/套餐/销售的数据访问接口
// 红线: Repository 不含业务规则，只做数据 CRUD
// ==========================================

use crate::domain::entity::{Credential, NewCredential, Package, Reseller, Sale, User};
use crate::domain::import::ImportBatch;
use crate::repository::error::RepositoryResult;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

// ==========================================
// 行写入变更集
// ==========================================
// 由 ReconciliationWriter 计算合并结果，Repository 在单个事务内落库

/// 凭证变更
#[derive(Debug, Clone, PartialEq)]
pub enum CredentialChange {
    Insert(NewCredential),
    Update(Credential),
}

/// 销售关联变更
#[derive(Debug, Clone, PartialEq)]
pub enum SaleChange {
    /// 新建（credentials_id 取本事务内的凭证 id）
    Insert {
        reseller_id: i64,
        sale_date: Option<DateTime<Utc>>,
        ho_date: Option<DateTime<Utc>>,
        msp_create: Option<DateTime<Utc>>,
        created_at: DateTime<Utc>,
    },
    Update(Sale),
}

/// 单行变更集
#[derive(Debug, Clone, PartialEq)]
pub struct RowChangeSet {
    pub credential: CredentialChange,
    pub user: Option<User>,
    pub sale: Option<SaleChange>,
}

/// 单行落库结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowChangeOutcome {
    pub credential_id: i64,
    pub credential_created: bool,
    pub user_updated: bool,
    pub sale_id: Option<i64>,
    pub sale_created: bool,
}

// ==========================================
// LedgerRepository Trait
// ==========================================
// 实现者: LedgerRepositoryImpl（使用 rusqlite）
#[async_trait]
pub trait LedgerRepository: Send + Sync {
    // ===== 套餐 =====

    async fn find_package_by_id(&self, id: i64) -> RepositoryResult<Option<Package>>;

    /// 按名称精确查找（由数据库做大小写不敏感比较）
    async fn find_packages_by_name(&self, name: &str) -> RepositoryResult<Vec<Package>>;

    /// 全量套餐（按 id 升序）
    async fn list_packages(&self) -> RepositoryResult<Vec<Package>>;

    async fn insert_package(&self, name: &str) -> RepositoryResult<Package>;

    // ===== 经销商 =====

    async fn find_reseller_by_id(&self, id: i64) -> RepositoryResult<Option<Reseller>>;

    async fn insert_reseller(&self, name: &str, email: Option<&str>) -> RepositoryResult<Reseller>;

    // ===== 客户 =====

    async fn find_user_by_id(&self, id: i64) -> RepositoryResult<Option<User>>;

    async fn insert_user(&self, name: &str, email: Option<&str>) -> RepositoryResult<User>;

    // ===== 凭证 =====

    async fn find_credential_by_id(&self, id: i64) -> RepositoryResult<Option<Credential>>;

    async fn find_credential_by_email(&self, email: &str) -> RepositoryResult<Option<Credential>>;

    async fn count_credentials(&self) -> RepositoryResult<usize>;

    // ===== 销售关联 =====

    /// 查询凭证当前的销售关联
    async fn find_sale_by_credential(&self, credential_id: i64) -> RepositoryResult<Option<Sale>>;

    async fn list_sales_by_credential(&self, credential_id: i64) -> RepositoryResult<Vec<Sale>>;

    async fn count_sales(&self) -> RepositoryResult<usize>;

    // ===== 行写入（事务化）=====

    /// 在单个事务内写入一行的全部变更
    ///
    /// # 返回
    /// - Ok(RowChangeOutcome): 提交成功
    /// - Err: 任一步骤失败，本行全部回滚（不影响已提交的其他行）
    async fn apply_row_changes(&self, changes: RowChangeSet) -> RepositoryResult<RowChangeOutcome>;

    // ===== 批次管理 =====

    async fn insert_batch(&self, batch: &ImportBatch) -> RepositoryResult<()>;

    async fn get_recent_batches(&self, limit: usize) -> RepositoryResult<Vec<ImportBatch>>;
}
