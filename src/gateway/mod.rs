// ==========================================
// 授权凭证管理后台 - 外部协作方
// ==========================================
// 职责: 权限检查、导入完成通知
// ==========================================

pub mod notification;
pub mod permission;

pub use notification::{NotificationSink, NotifyOutcome, TracingNotifier};
pub use permission::{
    PermissionChecker, Role, StaticPermissionChecker, ACTION_EDIT, ACTION_IMPORT, ACTION_VIEW,
    MODULE_CREDENTIALS,
};
