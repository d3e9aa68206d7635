// ==========================================
// 授权凭证管理后台 - 导入完成通知
// ==========================================
// 约束: 通知失败或超时不影响批次结果
// ==========================================

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::info;

/// 通知结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotifyOutcome {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl NotifyOutcome {
    pub fn ok() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
        }
    }
}

#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn notify(&self, channel: &str, payload: serde_json::Value) -> NotifyOutcome;
}

/// 写入日志的通知实现（无外部推送通道时使用）
pub struct TracingNotifier;

#[async_trait]
impl NotificationSink for TracingNotifier {
    async fn notify(&self, channel: &str, payload: serde_json::Value) -> NotifyOutcome {
        info!(channel = %channel, payload = %payload, "导入完成通知");
        NotifyOutcome::ok()
    }
}
