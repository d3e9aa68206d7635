// ==========================================
// 授权凭证管理后台 - 实体引用解析器
// ==========================================
// 阶段 4: 套餐/客户/经销商引用 → 实体 id
// 套餐: 有序策略链，首个命中即返回
// 客户/经销商: 仅按数字 id 解析，无法解析时不更新关联
// ==========================================

use crate::domain::entity::Package;
use crate::domain::import::{EntityReferences, NormalizedRecord};
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::importer_trait::{MatchContext, PackageMatcher};
use crate::repository::LedgerRepository;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};

/// 折叠空白（含换行）为单个空格并去首尾空白
pub fn prepare_token(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

// ==========================================
// 套餐匹配策略
// ==========================================

/// 1. 数字 id
pub struct IdMatcher;

#[async_trait]
impl PackageMatcher for IdMatcher {
    fn name(&self) -> &'static str {
        "id"
    }

    async fn try_match(&self, token: &str, ctx: &MatchContext<'_>) -> ImportResult<Option<i64>> {
        let id = match token.parse::<i64>() {
            Ok(id) => id,
            Err(_) => return Ok(None),
        };
        Ok(ctx.repo.find_package_by_id(id).await?.map(|p| p.id))
    }
}

/// 2. 数据库大小写不敏感精确匹配
pub struct StoreNameMatcher;

#[async_trait]
impl PackageMatcher for StoreNameMatcher {
    fn name(&self) -> &'static str {
        "store_name"
    }

    async fn try_match(&self, token: &str, ctx: &MatchContext<'_>) -> ImportResult<Option<i64>> {
        let found = ctx.repo.find_packages_by_name(token).await?;
        Ok(found.first().map(|p| p.id))
    }
}

/// 3. 客户端 Unicode 小写比较
pub struct ScanNameMatcher;

#[async_trait]
impl PackageMatcher for ScanNameMatcher {
    fn name(&self) -> &'static str {
        "scan_name"
    }

    async fn try_match(&self, token: &str, ctx: &MatchContext<'_>) -> ImportResult<Option<i64>> {
        let needle = token.to_lowercase();
        Ok(ctx
            .catalog
            .iter()
            .find(|p| prepare_token(&p.name).to_lowercase() == needle)
            .map(|p| p.id))
    }
}

/// 4. 双向子串匹配（多个候选取 id 最小者）
pub struct SubstringMatcher;

#[async_trait]
impl PackageMatcher for SubstringMatcher {
    fn name(&self) -> &'static str {
        "substring"
    }

    async fn try_match(&self, token: &str, ctx: &MatchContext<'_>) -> ImportResult<Option<i64>> {
        let needle = token.to_lowercase();
        Ok(ctx
            .catalog
            .iter()
            .filter(|p| {
                let name = prepare_token(&p.name).to_lowercase();
                !name.is_empty() && (name.contains(&needle) || needle.contains(&name))
            })
            .map(|p| p.id)
            .min())
    }
}

// ==========================================
// EntityResolver
// ==========================================
pub struct EntityResolver {
    repo: Arc<dyn LedgerRepository>,
    matchers: Vec<Box<dyn PackageMatcher>>,
    catalog: Vec<Package>,
}

impl EntityResolver {
    /// 默认策略链：id → 精确 → 扫描 → 子串
    pub fn default_matchers() -> Vec<Box<dyn PackageMatcher>> {
        vec![
            Box::new(IdMatcher),
            Box::new(StoreNameMatcher),
            Box::new(ScanNameMatcher),
            Box::new(SubstringMatcher),
        ]
    }

    /// 加载本批次套餐快照（导入管道不创建套餐，批次内快照不变）
    pub async fn load(repo: Arc<dyn LedgerRepository>) -> ImportResult<Self> {
        Self::with_matchers(repo, Self::default_matchers()).await
    }

    pub async fn with_matchers(
        repo: Arc<dyn LedgerRepository>,
        matchers: Vec<Box<dyn PackageMatcher>>,
    ) -> ImportResult<Self> {
        let catalog = repo.list_packages().await?;
        Ok(Self {
            repo,
            matchers,
            catalog,
        })
    }

    /// 解析套餐引用
    ///
    /// # 返回
    /// - Ok(None): 空引用（不更新套餐）
    /// - Ok(Some(id)): 命中
    /// - Err(PackageNotFound): 所有策略均未命中
    pub async fn resolve_package(&self, raw: &str) -> ImportResult<Option<i64>> {
        let token = prepare_token(raw);
        if token.is_empty() {
            return Ok(None);
        }

        let ctx = MatchContext {
            repo: self.repo.as_ref(),
            catalog: &self.catalog,
        };

        for matcher in &self.matchers {
            if let Some(id) = matcher.try_match(&token, &ctx).await? {
                debug!(token = %token, strategy = matcher.name(), package_id = id, "套餐匹配命中");
                return Ok(Some(id));
            }
        }

        Err(ImportError::PackageNotFound {
            token,
            known: self.catalog.iter().map(|p| p.name.clone()).collect(),
        })
    }

    /// 解析经销商引用（仅数字 id）
    pub async fn resolve_reseller(&self, row: usize, raw: Option<&str>) -> ImportResult<Option<i64>> {
        let token = match raw.map(prepare_token) {
            Some(t) if !t.is_empty() => t,
            _ => return Ok(None),
        };

        let id = match token.parse::<i64>() {
            Ok(id) => id,
            Err(_) => {
                warn!(row, reseller = %token, "经销商引用不是数字 id，跳过关联");
                return Ok(None);
            }
        };

        match self.repo.find_reseller_by_id(id).await? {
            Some(reseller) => Ok(Some(reseller.id)),
            None => {
                warn!(row, reseller_id = id, "经销商不存在，跳过关联");
                Ok(None)
            }
        }
    }

    /// 解析客户引用（仅数字 id）
    pub async fn resolve_user(&self, row: usize, user_id: Option<i64>) -> ImportResult<Option<i64>> {
        let id = match user_id {
            Some(id) => id,
            None => return Ok(None),
        };

        match self.repo.find_user_by_id(id).await? {
            Some(user) => Ok(Some(user.id)),
            None => {
                warn!(row, user_id = id, "客户不存在，跳过关联");
                Ok(None)
            }
        }
    }

    /// 解析一行的全部引用
    pub async fn resolve(&self, record: &NormalizedRecord) -> ImportResult<EntityReferences> {
        let package_id = match record.package.as_deref() {
            Some(raw) => self.resolve_package(raw).await?,
            None => None,
        };

        Ok(EntityReferences {
            package_id,
            user_id: self.resolve_user(record.row_number, record.user_id).await?,
            reseller_id: self
                .resolve_reseller(record.row_number, record.reseller.as_deref())
                .await?,
        })
    }
}
