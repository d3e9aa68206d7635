// ==========================================
// 授权凭证管理后台 - 原始行模型
// ==========================================
// 职责: 表头索引（每个文件解析一次）+ 只读原始行
// ==========================================

use crate::domain::types::CellValue;
use std::collections::HashMap;
use std::sync::Arc;

// ==========================================
// HeaderIndex - 表头索引
// ==========================================
// 列名按小写建立索引，查找不区分大小写
#[derive(Debug, Clone, PartialEq)]
pub struct HeaderIndex {
    names: Vec<String>,
    positions: HashMap<String, usize>,
}

impl HeaderIndex {
    pub fn new(names: Vec<String>) -> Self {
        let mut positions = HashMap::new();
        for (idx, name) in names.iter().enumerate() {
            // 重复列名只保留第一次出现
            positions.entry(name.to_lowercase()).or_insert(idx);
        }
        Self { names, positions }
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn position(&self, column: &str) -> Option<usize> {
        self.positions.get(&column.to_lowercase()).copied()
    }

    pub fn contains(&self, column: &str) -> bool {
        self.position(column).is_some()
    }
}

// ==========================================
// RawRow - 原始行
// ==========================================
#[derive(Debug, Clone)]
pub struct RawRow {
    row_number: usize, // 源文件数据行号（1 起，不含表头）
    header: Arc<HeaderIndex>,
    cells: Vec<CellValue>,
}

impl RawRow {
    pub fn new(row_number: usize, header: Arc<HeaderIndex>, cells: Vec<CellValue>) -> Self {
        Self {
            row_number,
            header,
            cells,
        }
    }

    pub fn row_number(&self) -> usize {
        self.row_number
    }

    pub fn get(&self, column: &str) -> Option<&CellValue> {
        self.header
            .position(column)
            .and_then(|idx| self.cells.get(idx))
    }

    /// 取去空白文本，缺列与空值均返回 None
    pub fn text(&self, column: &str) -> Option<String> {
        self.get(column).and_then(|c| c.as_text())
    }

    pub fn is_blank(&self) -> bool {
        self.cells.iter().all(|c| c.is_empty())
    }
}

// ==========================================
// ParsedSheet - 文件解析结果
// ==========================================
#[derive(Debug, Clone)]
pub struct ParsedSheet {
    pub headers: Vec<String>,
    pub rows: Vec<RawRow>,
}

impl ParsedSheet {
    /// 由表头与行单元格构造，自动丢弃全空行
    pub fn from_cells(headers: Vec<String>, raw_rows: Vec<Vec<CellValue>>) -> Self {
        let header = Arc::new(HeaderIndex::new(headers.clone()));
        let rows = raw_rows
            .into_iter()
            .enumerate()
            .map(|(idx, cells)| RawRow::new(idx + 1, header.clone(), cells))
            .filter(|row| !row.is_blank())
            .collect();

        Self { headers, rows }
    }

    pub fn header_index(&self) -> HeaderIndex {
        HeaderIndex::new(self.headers.clone())
    }
}
