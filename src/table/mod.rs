//! 表形式ファイル（CSV/TSV）の読み書き。
use std::path::Path;

use thiserror::Error;

mod reader;
mod writer;

pub use reader::read_table;
pub use writer::write_table;

/// pandas の既定で欠損値として扱われる表記。
const NA_MARKERS: [&str; 19] = [
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

#[derive(Debug, Error)]
pub enum TableError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed table: {0}")]
    Csv(#[from] csv::Error),
    #[error("table has no header row")]
    NoHeader,
    #[error("line {line}: expected at most {expected} fields, found {found}")]
    TooManyFields {
        line: u64,
        expected: usize,
        found: usize,
    },
    #[error("column '{0}' not found")]
    MissingColumn(String),
}

/// 区切り文字の種類。拡張子から判定する。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableFormat {
    Csv,
    Tsv,
}

impl TableFormat {
    /// 認識できる拡張子（大文字小文字を区別しない）なら形式を返す。
    #[must_use]
    pub fn from_path(path: &Path) -> Option<Self> {
        let extension = path.extension()?.to_str()?.to_ascii_lowercase();
        match extension.as_str() {
            "csv" => Some(Self::Csv),
            "tsv" => Some(Self::Tsv),
            _ => None,
        }
    }

    /// 拡張子が不明な場合は CSV とみなす。
    #[must_use]
    pub fn from_path_or_csv(path: &Path) -> Self {
        Self::from_path(path).unwrap_or(Self::Csv)
    }

    #[must_use]
    pub fn delimiter(self) -> u8 {
        match self {
            Self::Csv => b',',
            Self::Tsv => b'\t',
        }
    }
}

/// ソース表の1行。フィールドはヘッダと同じ長さに揃えられている。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRecord {
    /// 1 始まりの物理行番号（ヘッダ行を含む）。
    pub line: u64,
    pub fields: Vec<String>,
}

impl RawRecord {
    /// テキスト列の値。空や欠損表記なら `None`。
    #[must_use]
    pub fn text(&self, column: &TextColumn) -> Option<&str> {
        self.fields
            .get(column.index)
            .map(String::as_str)
            .filter(|value| !is_missing(value))
    }
}

/// ヘッダ上で一度だけ解決したテキスト列。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextColumn {
    pub name: String,
    pub index: usize,
}

impl TextColumn {
    /// # Errors
    /// ヘッダに列が存在しない場合は [`TableError::MissingColumn`]。
    pub fn resolve(headers: &[String], name: &str) -> Result<Self, TableError> {
        headers
            .iter()
            .position(|header| header == name)
            .map(|index| Self {
                name: name.to_string(),
                index,
            })
            .ok_or_else(|| TableError::MissingColumn(name.to_string()))
    }
}

/// 読み込んだ表。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TabularFile {
    pub headers: Vec<String>,
    pub records: Vec<RawRecord>,
}

impl TabularFile {
    /// テキスト列の空でない値を行順に取り出す。
    #[must_use]
    pub fn texts(&self, column: &TextColumn) -> Vec<String> {
        self.records
            .iter()
            .filter_map(|record| record.text(column))
            .map(ToString::to_string)
            .collect()
    }
}

/// 空白のみ、または欠損表記の値かどうか。
#[must_use]
pub fn is_missing(value: &str) -> bool {
    let trimmed = value.trim();
    trimmed.is_empty() || NA_MARKERS.contains(&trimmed)
}
