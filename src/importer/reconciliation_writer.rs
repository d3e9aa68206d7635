// ==========================================
// 授权凭证管理后台 - 对账写入器
// ==========================================
// 阶段 5: 标准化记录 + 实体引用 → 单行变更集 → 事务落库
// 合并规则: 非空字段覆盖，缺失字段保持不变
// 红线: 永不删除凭证；每行一个事务，失败只回滚本行
// ==========================================

use crate::domain::entity::{Credential, NewCredential, User};
use crate::domain::import::{EntityReferences, NormalizedRecord};
use crate::importer::error::{ImportError, ImportResult};
use crate::repository::{
    CredentialChange, LedgerRepository, RowChangeOutcome, RowChangeSet, SaleChange,
};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::debug;

fn overwrite<T: Clone>(target: &mut T, value: &Option<T>) {
    if let Some(v) = value {
        *target = v.clone();
    }
}

fn overwrite_opt<T: Clone>(target: &mut Option<T>, value: &Option<T>) {
    if value.is_some() {
        *target = value.clone();
    }
}

pub struct ReconciliationWriter {
    repo: Arc<dyn LedgerRepository>,
}

impl ReconciliationWriter {
    pub fn new(repo: Arc<dyn LedgerRepository>) -> Self {
        Self { repo }
    }

    /// 写入一行
    ///
    /// # 返回
    /// - Ok(RowChangeOutcome): 本行事务已提交
    /// - Err: RecordNotFound / RowValidationError / ConstraintViolation / PersistenceError
    pub async fn write(
        &self,
        record: &NormalizedRecord,
        refs: &EntityReferences,
    ) -> ImportResult<RowChangeOutcome> {
        let now = Utc::now();
        let changes = self.plan(record, refs, now).await?;
        let outcome = self.repo.apply_row_changes(changes).await?;

        debug!(
            row = record.row_number,
            credential_id = outcome.credential_id,
            created = outcome.credential_created,
            sale_id = ?outcome.sale_id,
            "行写入完成"
        );
        Ok(outcome)
    }

    /// 计算单行变更集（只读查询，不写库）
    pub async fn plan(
        &self,
        record: &NormalizedRecord,
        refs: &EntityReferences,
        now: DateTime<Utc>,
    ) -> ImportResult<RowChangeSet> {
        let existing = self.find_target(record).await?;
        self.check_email_unique(record, existing.as_ref()).await?;

        let credential = match existing {
            Some(current) => CredentialChange::Update(Self::merge_credential(
                current, record, refs, now,
            )),
            None => CredentialChange::Insert(Self::new_credential(record, refs, now)?),
        };

        let user = match refs.user_id {
            Some(user_id) if record.has_user_profile() => self
                .repo
                .find_user_by_id(user_id)
                .await?
                .map(|current| Self::merge_user(current, record, now)),
            _ => None,
        };

        let sale = match refs.reseller_id {
            Some(reseller_id) => Some(self.plan_sale(&credential, reseller_id, record, now).await?),
            None => None,
        };

        Ok(RowChangeSet {
            credential,
            user,
            sale,
        })
    }

    /// 定位目标凭证：id 优先，其次凭证邮箱
    async fn find_target(&self, record: &NormalizedRecord) -> ImportResult<Option<Credential>> {
        if let Some(id) = record.id {
            return match self.repo.find_credential_by_id(id).await? {
                Some(credential) => Ok(Some(credential)),
                None => Err(ImportError::RecordNotFound {
                    entity: "credential".to_string(),
                    id,
                }),
            };
        }

        match record.email.as_deref() {
            Some(email) => Ok(self.repo.find_credential_by_email(email).await?),
            None => Ok(None),
        }
    }

    /// 邮箱唯一性预检（数据库 UNIQUE 约束为最后防线）
    async fn check_email_unique(
        &self,
        record: &NormalizedRecord,
        target: Option<&Credential>,
    ) -> ImportResult<()> {
        let email = match record.email.as_deref() {
            Some(email) => email,
            None => return Ok(()),
        };

        if let Some(owner) = self.repo.find_credential_by_email(email).await? {
            if target.map(|t| t.id) != Some(owner.id) {
                return Err(ImportError::ConstraintViolation {
                    identifier: format!("email '{}' 已被凭证 {} 占用", email, owner.id),
                });
            }
        }
        Ok(())
    }

    fn merge_credential(
        mut current: Credential,
        record: &NormalizedRecord,
        refs: &EntityReferences,
        now: DateTime<Utc>,
    ) -> Credential {
        overwrite(&mut current.email, &record.email);
        overwrite(&mut current.password, &record.password);
        overwrite(&mut current.package_id, &refs.package_id);
        overwrite_opt(&mut current.quota, &record.quota);
        overwrite_opt(&mut current.code, &record.code);
        overwrite_opt(&mut current.user_id, &refs.user_id);
        overwrite_opt(&mut current.act_date, &record.act_date);
        overwrite_opt(&mut current.end_date, &record.end_date);
        current.updated_at = now;
        current
    }

    fn new_credential(
        record: &NormalizedRecord,
        refs: &EntityReferences,
        now: DateTime<Utc>,
    ) -> ImportResult<NewCredential> {
        let missing = |field: &str, message: &str| ImportError::RowValidationError {
            row: record.row_number,
            field: field.to_string(),
            message: message.to_string(),
        };

        let email = record
            .email
            .clone()
            .ok_or_else(|| missing("email", "新建凭证需要邮箱"))?;
        let password = record
            .password
            .clone()
            .ok_or_else(|| missing("password", "新建凭证需要密码"))?;
        let package_id = refs
            .package_id
            .ok_or_else(|| missing("package", "新建凭证需要有效套餐"))?;

        Ok(NewCredential {
            email,
            password,
            package_id,
            quota: record.quota,
            code: record.code.clone(),
            user_id: refs.user_id,
            act_date: record.act_date,
            end_date: record.end_date,
            created_at: now,
            updated_at: now,
        })
    }

    /// 客户资料合并（逐字段后写覆盖）
    fn merge_user(mut current: User, record: &NormalizedRecord, now: DateTime<Utc>) -> User {
        overwrite_opt(&mut current.name, &record.user_name);
        overwrite_opt(&mut current.email, &record.user_email);
        overwrite_opt(&mut current.company, &record.company);
        overwrite_opt(&mut current.tel, &record.tel);
        overwrite_opt(&mut current.address, &record.address);
        overwrite_opt(&mut current.city, &record.city);
        current.updated_at = now;
        current
    }

    /// 销售关联：已有则改挂经销商，否则新建（每个凭证至多一条）
    async fn plan_sale(
        &self,
        credential: &CredentialChange,
        reseller_id: i64,
        record: &NormalizedRecord,
        now: DateTime<Utc>,
    ) -> ImportResult<SaleChange> {
        let existing = match credential {
            CredentialChange::Update(c) => self.repo.find_sale_by_credential(c.id).await?,
            CredentialChange::Insert(_) => None,
        };

        Ok(match existing {
            Some(mut sale) => {
                sale.reseller_id = reseller_id;
                overwrite_opt(&mut sale.sale_date, &record.sale_date);
                overwrite_opt(&mut sale.ho_date, &record.ho_date);
                overwrite_opt(&mut sale.msp_create, &record.msp_create);
                sale.updated_at = now;
                SaleChange::Update(sale)
            }
            None => SaleChange::Insert {
                reseller_id,
                sale_date: record.sale_date,
                ho_date: record.ho_date,
                msp_create: record.msp_create,
                created_at: now,
            },
        })
    }
}
