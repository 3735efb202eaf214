//! Delimited table (CSV / TSV) text extraction.
//!
//! The first row is a header and is not part of the text. Every remaining
//! non-empty cell is joined in row-major order with single spaces.

use crate::extract::ExtractError;

pub fn extract_delimited(data: &[u8], delimiter: u8) -> Result<String, ExtractError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .has_headers(true)
        .from_reader(data);

    let mut cells: Vec<String> = Vec::new();
    for record in reader.records() {
        let record =
            record.map_err(|e| ExtractError::Parse(format!("Failed to read table record: {e}")))?;
        cells.extend(
            record
                .iter()
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .map(str::to_string),
        );
    }
    Ok(cells.join(" "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_csv_skips_header_and_joins_cells() {
        let data = "标题,评论\n1,很好\n2,非常漂亮\n";
        let text = extract_delimited(data.as_bytes(), b',').unwrap();
        assert_eq!(text, "1 很好 2 非常漂亮");
    }

    #[test]
    fn test_tsv_uses_tab_delimiter() {
        let data = "a\tb\nx,y\tz\n";
        let text = extract_delimited(data.as_bytes(), b'\t').unwrap();
        assert_eq!(text, "x,y z");
    }

    #[test]
    fn test_empty_cells_dropped_and_ragged_rows_allowed() {
        let data = "h1,h2,h3\n,好,\n快\n";
        let text = extract_delimited(data.as_bytes(), b',').unwrap();
        assert_eq!(text, "好 快");
    }

    #[test]
    fn test_header_only_yields_empty_text() {
        let text = extract_delimited(b"only,header\n", b',').unwrap();
        assert!(text.is_empty());
    }

    #[test]
    fn test_invalid_utf8_is_parse_error() {
        let data = b"h\n\xff\xfe\n";
        assert!(matches!(
            extract_delimited(data, b','),
            Err(ExtractError::Parse(_))
        ));
    }
}
