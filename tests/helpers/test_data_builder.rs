// ==========================================
// 测试数据构建器 - 用于集成测试
// ==========================================

use rust_xlsxwriter::{Workbook, XlsxError};

// ==========================================
// 台账 CSV 构建器
// ==========================================

/// 台账行（未设置的列输出为空）
#[derive(Debug, Clone, Default)]
pub struct LedgerRow {
    pub id: Option<String>,
    pub date: String,
    pub reseller: String,
    pub ho_date: String,
    pub package: Option<String>,
    pub acc_mail: Option<String>,
    pub password: Option<String>,
    pub quota: Option<String>,
    pub user_id: Option<String>,
    pub name: Option<String>,
    pub city: Option<String>,
}

impl LedgerRow {
    pub fn new(acc_mail: &str, reseller: &str, package: &str) -> Self {
        Self {
            date: "45658".to_string(),
            reseller: reseller.to_string(),
            ho_date: "2025-01-05".to_string(),
            package: Some(package.to_string()),
            acc_mail: Some(acc_mail.to_string()),
            password: Some("s3cret".to_string()),
            ..Default::default()
        }
    }

    pub fn quota(mut self, quota: i64) -> Self {
        self.quota = Some(quota.to_string());
        self
    }

    pub fn user(mut self, user_id: i64) -> Self {
        self.user_id = Some(user_id.to_string());
        self
    }

    pub fn profile(mut self, name: &str, city: &str) -> Self {
        self.name = Some(name.to_string());
        self.city = Some(city.to_string());
        self
    }

    pub fn id(mut self, id: i64) -> Self {
        self.id = Some(id.to_string());
        self
    }
}

const LEDGER_HEADER: &str = "id,date,reseller,hoDate,package,accMail,password,quota,userId,name,city";

fn quote(value: &str) -> String {
    if value.contains(',') || value.contains('"') || value.contains('\n') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn opt(value: &Option<String>) -> String {
    value.as_deref().map(quote).unwrap_or_default()
}

/// 生成台账 CSV 字节
pub fn ledger_csv(rows: &[LedgerRow]) -> Vec<u8> {
    let mut out = String::from(LEDGER_HEADER);
    out.push('\n');
    for row in rows {
        let line = [
            opt(&row.id),
            quote(&row.date),
            quote(&row.reseller),
            quote(&row.ho_date),
            opt(&row.package),
            opt(&row.acc_mail),
            opt(&row.password),
            opt(&row.quota),
            opt(&row.user_id),
            opt(&row.name),
            opt(&row.city),
        ]
        .join(",");
        out.push_str(&line);
        out.push('\n');
    }
    out.into_bytes()
}

/// 生成仅凭证 CSV 字节（email,password,package,quota）
pub fn credential_csv(rows: &[(&str, &str, &str, Option<i64>)]) -> Vec<u8> {
    let mut out = String::from("email,password,package,quota\n");
    for (email, password, package, quota) in rows {
        out.push_str(&format!(
            "{},{},{},{}\n",
            quote(email),
            quote(password),
            quote(package),
            quota.map(|q| q.to_string()).unwrap_or_default()
        ));
    }
    out.into_bytes()
}

/// 生成带 id 列的仅凭证 CSV 字节（id,email,password,package,quota）
pub fn credential_csv_with_ids(rows: &[(Option<i64>, &str, &str, &str, Option<i64>)]) -> Vec<u8> {
    let mut out = String::from("id,email,password,package,quota\n");
    for (id, email, password, package, quota) in rows {
        out.push_str(&format!(
            "{},{},{},{},{}\n",
            id.map(|v| v.to_string()).unwrap_or_default(),
            quote(email),
            quote(password),
            quote(package),
            quota.map(|q| q.to_string()).unwrap_or_default()
        ));
    }
    out.into_bytes()
}

// ==========================================
// 电子表格构建器
// ==========================================

/// 仅凭证工作簿单元格
pub enum XlsxCell {
    Text(&'static str),
    Number(f64),
    Blank,
}

/// 生成仅凭证 xlsx 字节
///
/// 第一个工作表为凭证数据，第二个工作表 "junk" 为干扰数据（不应被读取）
pub fn credential_xlsx(header: &[&str], rows: &[Vec<XlsxCell>]) -> Result<Vec<u8>, XlsxError> {
    let mut workbook = Workbook::new();

    let sheet = workbook.add_worksheet();
    sheet.set_name("credentials")?;
    for (col, name) in header.iter().enumerate() {
        sheet.write_string(0, col as u16, *name)?;
    }
    for (idx, row) in rows.iter().enumerate() {
        let row_num = idx as u32 + 1;
        for (col, cell) in row.iter().enumerate() {
            match cell {
                XlsxCell::Text(value) => {
                    sheet.write_string(row_num, col as u16, *value)?;
                }
                XlsxCell::Number(value) => {
                    sheet.write_number(row_num, col as u16, *value)?;
                }
                XlsxCell::Blank => {}
            }
        }
    }

    let junk = workbook.add_worksheet();
    junk.set_name("junk")?;
    junk.write_string(0, 0, "notes")?;
    junk.write_string(1, 0, "junk@x.com")?;

    workbook.save_to_buffer()
}
