// ==========================================
// 授权凭证管理后台 - 导入配置读取 Trait
// ==========================================
// 职责: 定义导入模块所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use crate::importer::error::ImportResult;
use async_trait::async_trait;

// ==========================================
// ImportConfigReader Trait
// ==========================================
// 实现者: ConfigManager（从 config_kv 表读取）
#[async_trait]
pub trait ImportConfigReader: Send + Sync {
    /// 上传文件大小上限（字节）
    ///
    /// # 默认值
    /// - 10 MiB
    async fn get_max_file_bytes(&self) -> ImportResult<usize>;

    /// 抽样校验行数
    ///
    /// # 默认值
    /// - 5
    async fn get_validation_sample_rows(&self) -> ImportResult<usize>;

    /// 连续持久化失败多少行后中止批次
    ///
    /// # 默认值
    /// - 3
    async fn get_persistence_failure_limit(&self) -> ImportResult<usize>;

    /// 通知发送超时（毫秒）
    ///
    /// # 默认值
    /// - 2000
    async fn get_notify_timeout_ms(&self) -> ImportResult<u64>;

    /// 通知通道名
    ///
    /// # 默认值
    /// - "credential-import"
    async fn get_notify_channel(&self) -> ImportResult<String>;
}
