// ==========================================
// 授权凭证管理后台 - 文件解析器实现
// ==========================================
// 阶段 1: 文件读取与解析
// 支持: CSV (.csv) / 电子表格 (.xlsx/.xls/.xlsm/.xlsb/.ods，仅第一个工作表)
// ==========================================

use crate::domain::row::ParsedSheet;
use crate::domain::types::{CellValue, FileKind};
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::importer_trait::FileParser;
use calamine::{open_workbook_auto_from_rs, Data, Reader};
use csv::ReaderBuilder;
use std::io::Cursor;
use std::path::Path;

const UTF8_BOM: char = '\u{feff}';

// ==========================================
// CSV Parser 实现
// ==========================================
pub struct CsvParser;

impl FileParser for CsvParser {
    fn parse_bytes(&self, bytes: &[u8]) -> ImportResult<ParsedSheet> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true) // 允许行长度不一致
            .from_reader(bytes);

        // 读取表头
        let headers: Vec<String> = reader
            .headers()?
            .iter()
            .map(|h| h.trim_start_matches(UTF8_BOM).trim().to_string())
            .collect();

        if headers.iter().all(|h| h.is_empty()) {
            return Err(ImportError::EmptyFile);
        }

        // 读取所有行
        let mut rows = Vec::new();
        for result in reader.records() {
            let record = result?;
            let cells = record
                .iter()
                .map(|value| {
                    let trimmed = value.trim();
                    if trimmed.is_empty() {
                        CellValue::Empty
                    } else {
                        CellValue::Text(trimmed.to_string())
                    }
                })
                .collect();
            rows.push(cells);
        }

        Ok(ParsedSheet::from_cells(headers, rows))
    }
}

// ==========================================
// Excel Parser 实现
// ==========================================
pub struct ExcelParser;

impl ExcelParser {
    /// calamine 单元格 → 原始单元格
    ///
    /// 日期单元格保留序列号，由 TypeNormalizer 统一换算
    pub fn convert_cell(cell: &Data) -> CellValue {
        match cell {
            Data::Empty | Data::Error(_) => CellValue::Empty,
            Data::String(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    CellValue::Empty
                } else {
                    CellValue::Text(trimmed.to_string())
                }
            }
            Data::Float(f) => CellValue::Number(*f),
            Data::Int(i) => CellValue::Number(*i as f64),
            Data::Bool(b) => CellValue::Text(b.to_string()),
            Data::DateTime(dt) => CellValue::Number(dt.as_f64()),
            Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::Text(s.trim().to_string()),
        }
    }
}

impl FileParser for ExcelParser {
    fn parse_bytes(&self, bytes: &[u8]) -> ImportResult<ParsedSheet> {
        let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))?;

        // 读取第一个 sheet
        let sheet_names = workbook.sheet_names();
        let sheet_name = sheet_names
            .first()
            .cloned()
            .ok_or_else(|| ImportError::ExcelParseError("Excel 文件无工作表".to_string()))?;

        let range = workbook
            .worksheet_range(&sheet_name)
            .map_err(|e| ImportError::ExcelParseError(e.to_string()))?;

        // 提取表头（第一行）
        let mut rows_iter = range.rows();
        let header_row = rows_iter.next().ok_or(ImportError::EmptyFile)?;

        let headers: Vec<String> = header_row
            .iter()
            .map(|cell| Self::convert_cell(cell).as_text().unwrap_or_default())
            .collect();

        if headers.iter().all(|h| h.is_empty()) {
            return Err(ImportError::EmptyFile);
        }

        let rows = rows_iter
            .map(|data_row| data_row.iter().map(Self::convert_cell).collect())
            .collect();

        Ok(ParsedSheet::from_cells(headers, rows))
    }
}

// ==========================================
// 通用文件解析器（扩展名/MIME 判定 + 大小上限）
// ==========================================
pub struct UniversalFileParser {
    max_file_bytes: usize,
}

impl UniversalFileParser {
    pub fn new(max_file_bytes: usize) -> Self {
        Self { max_file_bytes }
    }

    /// 判定文件类型：扩展名优先，其次 MIME
    pub fn detect_kind(file_name: &str, mime_type: Option<&str>) -> ImportResult<FileKind> {
        let ext = Path::new(file_name)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();

        match ext.as_str() {
            "csv" => return Ok(FileKind::Csv),
            "xlsx" | "xlsm" | "xls" | "xlsb" | "ods" => return Ok(FileKind::Spreadsheet),
            _ => {}
        }

        let mime = mime_type
            .map(|m| m.split(';').next().unwrap_or("").trim().to_lowercase())
            .unwrap_or_default();

        match mime.as_str() {
            "text/csv" | "application/csv" => Ok(FileKind::Csv),
            "application/vnd.ms-excel"
            | "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
            | "application/vnd.oasis.opendocument.spreadsheet" => Ok(FileKind::Spreadsheet),
            _ => {
                let shown = if ext.is_empty() { mime } else { ext };
                Err(ImportError::UnsupportedFormat(shown))
            }
        }
    }

    pub fn parse(
        &self,
        bytes: &[u8],
        file_name: &str,
        mime_type: Option<&str>,
    ) -> ImportResult<ParsedSheet> {
        let kind = Self::detect_kind(file_name, mime_type)?;

        if bytes.len() > self.max_file_bytes {
            return Err(ImportError::OversizeFile {
                size: bytes.len(),
                limit: self.max_file_bytes,
            });
        }

        match kind {
            FileKind::Csv => CsvParser.parse_bytes(bytes),
            FileKind::Spreadsheet => ExcelParser.parse_bytes(bytes),
        }
    }
}
