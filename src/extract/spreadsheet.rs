//! Spreadsheet extraction: first sheet as tab-separated text

use super::ExtractError;
use calamine::{Reader, open_workbook_auto_from_rs};
use std::io::Cursor;

/// Render a grid as tab-separated columns and newline-separated rows
pub fn render_rows<R, C>(rows: R) -> String
where
    R: IntoIterator,
    R::Item: IntoIterator<Item = C>,
    C: ToString,
{
    rows.into_iter()
        .map(|row| {
            row.into_iter()
                .map(|cell| cell.to_string())
                .collect::<Vec<_>>()
                .join("\t")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Extract the first worksheet of an xlsx/xls workbook
pub fn extract(bytes: &[u8]) -> Result<String, ExtractError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes.to_vec()))
        .map_err(|e| ExtractError::Spreadsheet(e.to_string()))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| ExtractError::Spreadsheet("workbook has no worksheets".to_string()))?
        .map_err(|e| ExtractError::Spreadsheet(e.to_string()))?;

    Ok(render_rows(range.rows().map(|row| row.iter())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    const WORKBOOK: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">
  <sheets><sheet name="Sheet1" sheetId="1" r:id="rId1"/></sheets>
</workbook>"#;

    const WORKBOOK_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/>
</Relationships>"#;

    const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
  <Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
  <Default Extension="xml" ContentType="application/xml"/>
  <Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>
  <Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>
</Types>"#;

    fn xlsx_with(sheet_data: &str) -> Vec<u8> {
        let sheet = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData>{}</sheetData></worksheet>"#,
            sheet_data
        );
        let parts = [
            ("[Content_Types].xml", CONTENT_TYPES.to_string()),
            ("xl/workbook.xml", WORKBOOK.to_string()),
            ("xl/_rels/workbook.xml.rels", WORKBOOK_RELS.to_string()),
            ("xl/worksheets/sheet1.xml", sheet),
        ];

        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        for (name, body) in parts {
            writer
                .start_file(name, SimpleFileOptions::default())
                .expect("start file");
            writer.write_all(body.as_bytes()).expect("write part");
        }
        writer.finish().expect("finish zip").into_inner()
    }

    #[test]
    fn test_first_sheet_of_workbook_as_tsv() {
        let bytes = xlsx_with(
            r#"<row r="1"><c r="A1" t="inlineStr"><is><t>a</t></is></c><c r="B1" t="inlineStr"><is><t>b</t></is></c></row>
<row r="2"><c r="A2"><v>1</v></c><c r="B2"><v>2</v></c></row>"#,
        );
        assert_eq!(extract(&bytes).expect("valid workbook"), "a\tb\n1\t2");
    }

    #[test]
    fn test_fractional_numbers_keep_their_digits() {
        let bytes = xlsx_with(r#"<row r="1"><c r="A1"><v>1</v></c><c r="B1"><v>2.5</v></c></row>"#);
        assert_eq!(extract(&bytes).expect("valid workbook"), "1\t2.5");
    }

    #[test]
    fn test_render_rows_tab_separated() {
        let grid = vec![vec!["a", "b"], vec!["1", "2"]];
        assert_eq!(render_rows(grid), "a\tb\n1\t2");
    }

    #[test]
    fn test_render_rows_keeps_empty_cells() {
        let grid = vec![vec!["name", "", "age"]];
        assert_eq!(render_rows(grid), "name\t\tage");
        assert_eq!(render_rows(Vec::<Vec<&str>>::new()), "");
    }

    #[test]
    fn test_non_workbook_bytes_are_rejected() {
        let result = extract(b"definitely not a workbook");
        assert!(matches!(result, Err(ExtractError::Spreadsheet(_))));
    }
}
