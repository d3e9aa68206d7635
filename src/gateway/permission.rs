// ==========================================
// 授权凭证管理后台 - 权限检查
// ==========================================
// 职责: 批次开始前检查调用方是否可执行导入
// ==========================================

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// 导入动作
pub const ACTION_IMPORT: &str = "import";
/// 编辑动作
pub const ACTION_EDIT: &str = "edit";
/// 查看动作
pub const ACTION_VIEW: &str = "view";
/// 凭证模块
pub const MODULE_CREDENTIALS: &str = "credentials";

#[async_trait]
pub trait PermissionChecker: Send + Sync {
    /// 检查当前调用方是否可在 module 上执行 action
    async fn check_permission(&self, action: &str, module: &str) -> bool;

    async fn can_edit(&self, module: &str) -> bool {
        self.check_permission(ACTION_EDIT, module).await
    }
}

/// 角色
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Admin,
    Operator,
    Viewer,
}

/// 静态角色权限表
#[derive(Debug, Clone)]
pub struct StaticPermissionChecker {
    allow_all: bool,
    grants: HashSet<(String, String)>,
}

impl StaticPermissionChecker {
    pub fn for_role(role: Role) -> Self {
        match role {
            Role::Admin => Self {
                allow_all: true,
                grants: HashSet::new(),
            },
            Role::Operator => Self::with_grants(&[
                (ACTION_VIEW, MODULE_CREDENTIALS),
                (ACTION_EDIT, MODULE_CREDENTIALS),
                (ACTION_IMPORT, MODULE_CREDENTIALS),
            ]),
            Role::Viewer => Self::with_grants(&[(ACTION_VIEW, MODULE_CREDENTIALS)]),
        }
    }

    pub fn with_grants(grants: &[(&str, &str)]) -> Self {
        Self {
            allow_all: false,
            grants: grants
                .iter()
                .map(|(a, m)| (a.to_string(), m.to_string()))
                .collect(),
        }
    }

    pub fn deny_all() -> Self {
        Self::with_grants(&[])
    }
}

#[async_trait]
impl PermissionChecker for StaticPermissionChecker {
    async fn check_permission(&self, action: &str, module: &str) -> bool {
        self.allow_all
            || self
                .grants
                .contains(&(action.to_string(), module.to_string()))
    }
}
