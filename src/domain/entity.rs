// ==========================================
// 授权凭证管理后台 - 业务实体
// ==========================================
// 对齐: db::init_schema 中的 credential/user/reseller/package/sale 表
// 红线: 导入管道从不删除凭证，也不创建套餐
// ==========================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ==========================================
// Credential - 授权凭证（账号 + 密钥）
// ==========================================
// 唯一约束: email
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Credential {
    pub id: i64,
    pub email: String,
    pub password: String,
    pub package_id: i64,
    pub quota: Option<i64>,
    pub code: Option<String>,
    pub user_id: Option<i64>,
    pub act_date: Option<DateTime<Utc>>, // 激活日期
    pub end_date: Option<DateTime<Utc>>, // 到期日期
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 待新建凭证（id 由数据库分配）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewCredential {
    pub email: String,
    pub password: String,
    pub package_id: i64,
    pub quota: Option<i64>,
    pub code: Option<String>,
    pub user_id: Option<i64>,
    pub act_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ==========================================
// User - 终端客户
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub name: Option<String>,
    pub email: Option<String>,
    pub company: Option<String>,
    pub tel: Option<i64>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ==========================================
// Reseller - 经销商（导入只读）
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reseller {
    pub id: i64,
    pub name: String,
    pub email: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ==========================================
// Package - 套餐（导入只读）
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Package {
    pub id: i64,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// ==========================================
// Sale - 销售关联（凭证 ↔ 经销商）
// ==========================================
// 唯一约束: (reseller_id, credentials_id)
// 一个凭证同一时刻最多一条销售关联
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sale {
    pub id: i64,
    pub reseller_id: i64,
    pub credentials_id: i64,
    pub sale_date: Option<DateTime<Utc>>,  // 台账 date
    pub ho_date: Option<DateTime<Utc>>,    // 台账 hoDate（交付日期）
    pub msp_create: Option<DateTime<Utc>>, // 台账 mspCreate
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
