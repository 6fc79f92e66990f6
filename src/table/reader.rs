use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord, Trim};

use super::{RawRecord, TableError, TableFormat, TabularFile};

const UTF8_BOM: char = '\u{feff}';

/// 区切り文字付きファイルを読み込む。
///
/// ヘッダより短い行は空文字で補い、長い行はエラーにする。
///
/// # Errors
/// ファイルが開けない、ヘッダが無い、CSV として不正な場合。
pub fn read_table(path: &Path, format: TableFormat) -> Result<TabularFile, TableError> {
    let file = File::open(path)?;
    read_from(file, format)
}

pub(crate) fn read_from<R: Read>(
    source: R,
    format: TableFormat,
) -> Result<TabularFile, TableError> {
    let mut reader = ReaderBuilder::new()
        .delimiter(format.delimiter())
        .has_headers(true)
        .flexible(true)
        .trim(Trim::None)
        .from_reader(source);

    let headers = header_names(reader.headers()?);
    if headers.is_empty() || headers.iter().all(String::is_empty) {
        return Err(TableError::NoHeader);
    }

    let mut records = Vec::new();
    let mut record = StringRecord::new();
    while reader.read_record(&mut record)? {
        let line = record.position().map_or(0, csv::Position::line);
        if record.len() > headers.len() {
            return Err(TableError::TooManyFields {
                line,
                expected: headers.len(),
                found: record.len(),
            });
        }
        let mut fields: Vec<String> = record.iter().map(ToString::to_string).collect();
        fields.resize(headers.len(), String::new());
        records.push(RawRecord { line, fields });
    }

    Ok(TabularFile { headers, records })
}

fn header_names(record: &StringRecord) -> Vec<String> {
    record
        .iter()
        .enumerate()
        .map(|(i, name)| {
            if i == 0 {
                name.trim_start_matches(UTF8_BOM).to_string()
            } else {
                name.to_string()
            }
        })
        .collect()
}
