// Spreadsheet row sources.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use bzip2_rs::DecoderReader;
use calamine::{open_workbook_auto, Data, Range, Reader, Sheets};
use encoding_rs::Encoding;

use super::errors::{DictError, Result};
use super::processor::Row;
use super::util::*;


/// Supplies the rows of a spreadsheet, header rows included.
pub trait RowSource {
    fn sheet_names(&self) -> Vec<String>;
    fn rows(&mut self) -> Result<Vec<Row>>;
}

/// Pads or cuts a row to the configured width.
fn fit_row(mut row: Row, columns: usize) -> Row {
    row.resize(columns, None);
    row
}


/// Workbooks calamine can open (xlsx, xls, ods). Only the first sheet is read.
pub struct XlsxSource {
    workbook: Sheets<BufReader<File>>,
    columns: usize,
}

impl XlsxSource {
    pub fn open(path: &Path, columns: usize) -> Result<XlsxSource> {
        Ok(XlsxSource {
            workbook: open_workbook_auto(path)?,
            columns,
        })
    }
}

fn cell_value(cell: &Data) -> Option<String> {
    match cell {
        Data::Empty => None,
        Data::String(s) if s.is_empty() => None,
        Data::String(s) => Some(s.clone()),
        _ => Some(cell.to_string()),
    }
}

impl RowSource for XlsxSource {
    fn sheet_names(&self) -> Vec<String> {
        self.workbook.sheet_names()
    }

    fn rows(&mut self) -> Result<Vec<Row>> {
        let name = self.workbook.sheet_names().into_iter().next()
            .ok_or_else(|| DictError::Spreadsheet(String::from("workbook has no sheet")))?;
        let range = self.workbook.worksheet_range(&name)?;
        Ok(rows_from_range(&range, self.columns))
    }
}

/// Rows of a sheet, indexed from A1. The range only spans the used cells,
/// leading empty rows and columns are put back.
fn rows_from_range(range: &Range<Data>, columns: usize) -> Vec<Row> {
    let (row0, col0) = match range.start() {
        Some((r, c)) => (r as usize, c as usize),
        None => return Vec::new(),
    };

    let mut rows: Vec<Row> = (0..row0).map(|_| vec![None; columns]).collect();
    for r in range.rows() {
        let row: Row = std::iter::repeat(None)
            .take(col0)
            .chain(r.iter().map(cell_value))
            .take(columns)
            .collect();
        rows.push(fit_row(row, columns));
    }
    rows
}


/// Tab separated export of the spreadsheet, optionally bzip2 compressed.
#[derive(Debug)]
pub struct TsvSource {
    path: PathBuf,
    columns: usize,
    encoding: &'static Encoding,
}

impl TsvSource {
    pub fn open(path: &Path, columns: usize, encoding: &str) -> Result<TsvSource> {
        let encoding = Encoding::for_label(encoding.as_bytes())
            .ok_or_else(|| DictError::Config(format!("unknown source encoding: {}", encoding)))?;
        if !path.is_file() {
            return Err(DictError::Spreadsheet(format!("cannot open {}", path.display())));
        }
        Ok(TsvSource {
            path: path.to_path_buf(),
            columns,
            encoding,
        })
    }

    fn read_bytes(&self) -> Result<Vec<u8>> {
        if is_bz2(&self.path) {
            let mut buf = Vec::new();
            let mut reader = DecoderReader::new(File::open(&self.path)?);
            reader.read_to_end(&mut buf)?;
            Ok(buf)
        } else {
            Ok(read_file_vec(&self.path)?)
        }
    }
}

impl RowSource for TsvSource {
    fn sheet_names(&self) -> Vec<String> {
        let name = self.path.file_stem().map_or(String::new(), |s| s.to_string_lossy().into_owned());
        vec![name]
    }

    fn rows(&mut self) -> Result<Vec<Row>> {
        let buf = self.read_bytes()?;
        let (cow, _encoding_used, had_errors) = self.encoding.decode(&buf);
        if had_errors {
            log::warn!("{}: malformed {} sequences replaced", self.path.display(), self.encoding.name());
        }

        let columns = self.columns;
        Ok(cow.lines()
            .map(|line| {
                let row = line.split('\t')
                    .take(columns)
                    .map(|cell| if cell.is_empty() { None } else { Some(String::from(cell)) })
                    .collect();
                fit_row(row, columns)
            })
            .collect())
    }
}

fn is_bz2(path: &Path) -> bool {
    path.extension().map_or(false, |e| e.eq_ignore_ascii_case("bz2"))
}

fn is_tsv(path: &Path) -> bool {
    let path = if is_bz2(path) { path.file_stem().map(Path::new) } else { Some(path) };
    path.and_then(|p| p.extension())
        .map_or(false, |e| e.eq_ignore_ascii_case("tsv") || e.eq_ignore_ascii_case("txt"))
}

/// Picks the reader from the file extension.
pub fn open_source(path: &Path, columns: usize, encoding: &str) -> Result<Box<dyn RowSource>> {
    if is_tsv(path) {
        Ok(Box::new(TsvSource::open(path, columns, encoding)?))
    } else {
        Ok(Box::new(XlsxSource::open(path, columns)?))
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tsv_rows_are_fitted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vol.tsv");
        std::fs::write(&path, "a\tb\n\t\tc\td\te\r\n").unwrap();

        let mut source = open_source(&path, 4, "utf-8").unwrap();
        assert_eq!(source.sheet_names(), vec![String::from("vol")]);
        let rows = source.rows().unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0], vec![Some(String::from("a")), Some(String::from("b")), None, None]);
        assert_eq!(rows[1], vec![None, None, Some(String::from("c")), Some(String::from("d"))]);
    }

    #[test]
    fn tsv_is_decoded_with_label() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vol.txt");
        // "แมว" in TIS-620
        std::fs::write(&path, b"\xe1\xc1\xc7\tcat\n").unwrap();

        let mut source = open_source(&path, 2, "tis-620").unwrap();
        let rows = source.rows().unwrap();
        assert_eq!(rows[0][0].as_deref(), Some("แมว"));
    }

    #[test]
    fn extensions() {
        assert!(is_tsv(Path::new("a.tsv")));
        assert!(is_tsv(Path::new("a.TXT.bz2")));
        assert!(!is_tsv(Path::new("a.xlsx")));
        assert!(is_bz2(Path::new("a.tsv.bz2")));
    }

    /// Minimal xlsx package with inline strings, `cells` are (reference, row, xml).
    fn write_xlsx(path: &Path, cells: &[(&str, u32, &str)]) {
        use std::io::Write;
        use zip::write::SimpleFileOptions;

        let mut sheet_rows = String::new();
        let mut rows: Vec<u32> = cells.iter().map(|&(_, row, _)| row).collect();
        rows.dedup();
        for row in rows {
            sheet_rows.push_str(&format!(r#"<row r="{}">"#, row));
            for &(reference, _, xml) in cells.iter().filter(|&&(_, r, _)| r == row) {
                sheet_rows.push_str(&format!(r#"<c r="{}"{}</c>"#, reference, xml));
            }
            sheet_rows.push_str("</row>");
        }

        let parts = [
            ("[Content_Types].xml", String::from(concat!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
                r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#,
                r#"<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>"#,
                r#"<Default Extension="xml" ContentType="application/xml"/>"#,
                r#"<Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/>"#,
                r#"<Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/>"#,
                r#"</Types>"#))),
            ("_rels/.rels", String::from(concat!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
                r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
                r#"<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/>"#,
                r#"</Relationships>"#))),
            ("xl/workbook.xml", String::from(concat!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
                r#"<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" "#,
                r#"xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships">"#,
                r#"<sheets><sheet name="vol" sheetId="1" r:id="rId1"/></sheets></workbook>"#))),
            ("xl/_rels/workbook.xml.rels", String::from(concat!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
                r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#,
                r#"<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/>"#,
                r#"</Relationships>"#))),
            ("xl/worksheets/sheet1.xml", format!(concat!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
                r#"<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main">"#,
                r#"<sheetData>{}</sheetData></worksheet>"#), sheet_rows)),
        ];

        let mut zip = zip::ZipWriter::new(File::create(path).unwrap());
        for (name, content) in parts.iter() {
            zip.start_file(*name, SimpleFileOptions::default()).unwrap();
            zip.write_all(content.as_bytes()).unwrap();
        }
        zip.finish().unwrap();
    }

    fn text(s: &str) -> String {
        format!(r#" t="inlineStr"><is><t>{}</t></is>"#, s)
    }

    #[test]
    fn workbook_cells_keep_their_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("vol.xlsx");
        let (thaiphon, thai, english) = (text("Thaiphon"), text("Thai"), text("English"));
        let (pron, thai_word, english_word) = (text("mɛɛw"), text("แมว"), text("cat"));
        // first row and columns A, B empty
        write_xlsx(&path, &[
            ("C2", 2, &thaiphon),
            ("D2", 2, &thai),
            ("F2", 2, &english),
            ("C3", 3, &pron),
            ("D3", 3, &thai_word),
            ("F3", 3, &english_word),
            ("N3", 3, "><v>2.5</v>"),
        ]);

        let mut source = open_source(&path, 32, "utf-8").unwrap();
        assert_eq!(source.sheet_names(), vec![String::from("vol")]);
        let rows = source.rows().unwrap();
        assert_eq!(rows.len(), 3);
        assert!(rows.iter().all(|r| r.len() == 32));
        assert!(rows[0].iter().all(Option::is_none));
        assert_eq!(rows[1][3].as_deref(), Some("Thai"));
        assert_eq!(rows[2][0], None);
        assert_eq!(rows[2][2].as_deref(), Some("mɛɛw"));
        assert_eq!(rows[2][3].as_deref(), Some("แมว"));
        assert_eq!(rows[2][4], None);
        assert_eq!(rows[2][5].as_deref(), Some("cat"));
        assert_eq!(rows[2][13].as_deref(), Some("2.5"));
    }

    #[test]
    fn range_offset_is_restored() {
        let mut range = Range::new((1, 2), (2, 40));
        range.set_value((2, 3), Data::String(String::from("แมว")));
        range.set_value((2, 40), Data::String(String::from("cut")));

        let rows = rows_from_range(&range, 32);
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[2][3].as_deref(), Some("แมว"));
        assert!(rows[2].iter().filter(|c| c.is_some()).count() == 1);
        assert!(rows_from_range(&Range::empty(), 32).is_empty());
    }

    #[test]
    fn unreadable_workbook_is_spreadsheet_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.xlsx");
        std::fs::write(&path, "not a workbook").unwrap();
        assert!(matches!(open_source(&path, 32, "utf-8"), Err(DictError::Spreadsheet(_))));
    }
}
