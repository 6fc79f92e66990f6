use std::io::{self, Write};

use csv::{QuoteStyle, WriterBuilder};

use super::TableFormat;

/// ヘッダと行を書き出し、フラッシュ済みの書き込み先を返す。
///
/// # Errors
/// 書き込みに失敗した場合。
pub fn write_table<W, R, F>(
    sink: W,
    format: TableFormat,
    headers: &[String],
    rows: R,
) -> io::Result<W>
where
    W: Write,
    R: IntoIterator<Item = F>,
    F: IntoIterator,
    F::Item: AsRef<[u8]>,
{
    let mut writer = WriterBuilder::new()
        .delimiter(format.delimiter())
        .quote_style(QuoteStyle::Necessary)
        .from_writer(sink);
    writer.write_record(headers)?;
    for row in rows {
        writer.write_record(row)?;
    }
    writer.flush()?;
    writer
        .into_inner()
        .map_err(|error| io::Error::new(error.error().kind(), error.error().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::reader::read_from;

    #[test]
    fn written_rows_read_back_with_quoting() {
        let headers = vec!["id".to_string(), "description".to_string()];
        let rows = vec![vec!["1", "hosting, managed"], vec!["2", "line\nbreak"]];
        let bytes = write_table(Vec::new(), TableFormat::Csv, &headers, rows).unwrap();
        let text = String::from_utf8(bytes.clone()).unwrap();
        assert!(text.starts_with("id,description\n"));

        let table = read_from(bytes.as_slice(), TableFormat::Csv).unwrap();
        assert_eq!(table.records[0].fields[1], "hosting, managed");
        assert_eq!(table.records[1].fields[1], "line\nbreak");
    }

    #[test]
    fn header_only_table() {
        let headers = vec!["description".to_string()];
        let bytes =
            write_table(Vec::new(), TableFormat::Tsv, &headers, Vec::<Vec<&str>>::new()).unwrap();
        assert_eq!(bytes, b"description\n");
    }
}
