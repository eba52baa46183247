//! Spreadsheet files decoded with calamine, exposed as a forward-only [`SheetReader`].
use crate::spreadsheet::SheetReader;
use crate::spreadsheet::SpreadsheetError;
use crate::spreadsheet::SpreadsheetError::InvalidFileFormat;
use crate::spreadsheet::Value;
use crate::spreadsheet::EMPTY;
use calamine::open_workbook;
use calamine::Data;
use calamine::Ods;
use calamine::Range;
use calamine::Reader;
use calamine::Xls;
use calamine::Xlsb;
use calamine::Xlsx;
use chrono::NaiveDate;
use chrono::NaiveDateTime;
use iso8601_duration::Duration as IsoDuration;
use std::ffi::OsStr;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::debug;

/// Type alias for buffered file reader
pub type FileReader = BufReader<File>;

/// Wrapper enum for the calamine reader of each supported format.
pub enum Spreadsheet {
    /// Excel 2007+ format reader (.xlsx, .xlsm, .xlam)
    Xlsx(Xlsx<FileReader>),
    /// Excel Binary format reader (.xlsb)
    Xlsb(Xlsb<FileReader>),
    /// Legacy Excel format reader (.xls, .xla)
    Xls(Xls<FileReader>),
    /// OpenDocument format reader (.ods)
    Ods(Ods<FileReader>),
}

impl Spreadsheet {
    /// Opens a spreadsheet file, choosing the decoder from the file extension.
    ///
    /// Supported formats (extension matching is case-insensitive):
    /// - `.xlsx`, `.xlsm`, `.xlam` - Excel 2007+ format
    /// - `.xlsb` - Excel Binary format
    /// - `.xls`, `.xla` - Legacy Excel format
    /// - `.ods` - OpenDocument format
    ///
    /// # Errors
    ///
    /// Returns an error if the extension is not supported or the file cannot
    /// be opened or decoded.
    pub fn open<P>(path: P) -> Result<Spreadsheet, SpreadsheetError>
    where
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        let extension = path
            .extension()
            .and_then(OsStr::to_str)
            .map(str::to_ascii_lowercase);
        let spreadsheet = match extension.as_deref() {
            Some("xlsx") | Some("xlsm") | Some("xlam") => Self::Xlsx(open_workbook(path)?),
            Some("xlsb") => Self::Xlsb(open_workbook(path)?),
            Some("xls") | Some("xla") => Self::Xls(open_workbook(path)?),
            Some("ods") => Self::Ods(open_workbook(path)?),
            _ => Err(InvalidFileFormat {
                name: path.to_string_lossy().to_string(),
            })?,
        };
        debug!(path = %path.display(), format = spreadsheet.format(), "opened spreadsheet");
        Ok(spreadsheet)
    }

    /// Short name of the detected format.
    pub const fn format(&self) -> &'static str {
        match self {
            Self::Xlsx(_) => "xlsx",
            Self::Xlsb(_) => "xlsb",
            Self::Xls(_) => "xls",
            Self::Ods(_) => "ods",
        }
    }

    /// Returns the names of all sheets in file order.
    pub fn sheet_names(&self) -> Vec<String> {
        match self {
            Self::Xlsx(xlsx) => xlsx.sheet_names(),
            Self::Xlsb(xlsb) => xlsb.sheet_names(),
            Self::Xls(xls) => xls.sheet_names(),
            Self::Ods(ods) => ods.sheet_names(),
        }
    }

    /// Loads every cell of the named sheet.
    pub fn worksheet_range(&mut self, sheet_name: &str) -> Result<Range<Data>, SpreadsheetError> {
        match self {
            Self::Xlsx(xlsx) => Ok(xlsx.worksheet_range(sheet_name)?),
            Self::Xlsb(xlsb) => Ok(xlsb.worksheet_range(sheet_name)?),
            Self::Xls(xls) => Ok(xls.worksheet_range(sheet_name)?),
            Self::Ods(ods) => Ok(ods.worksheet_range(sheet_name)?),
        }
    }
}

/// Forward-only row cursor over a [`Spreadsheet`].
///
/// Sheets are loaded lazily, on the first [`read`](SheetReader::read) after
/// the cursor reaches them. Rows are reported from the top of the sheet
/// (row 0), so leading blank rows still count, and every row of a sheet has
/// as many fields as the sheet's last used column.
pub struct Workbook {
    spreadsheet: Spreadsheet,
    sheet_names: Vec<String>,
    sheet_index: usize,
    /// Cells of the current sheet, once loaded
    range: Option<Range<Data>>,
    /// Next row to hand out (0-based, absolute)
    next_row: u32,
    /// Values of the current row
    row: Vec<Value>,
}

impl Workbook {
    /// Opens a spreadsheet file positioned on its first sheet.
    pub fn open<P>(path: P) -> Result<Workbook, SpreadsheetError>
    where
        P: AsRef<Path>,
    {
        Ok(Self::new(Spreadsheet::open(path)?))
    }

    /// Wraps an already opened spreadsheet.
    pub fn new(spreadsheet: Spreadsheet) -> Workbook {
        Workbook {
            sheet_names: spreadsheet.sheet_names(),
            spreadsheet,
            sheet_index: 0,
            range: None,
            next_row: 0,
            row: Vec::new(),
        }
    }

    /// Names of all sheets in file order.
    pub fn sheet_names(&self) -> &[String] {
        &self.sheet_names
    }
}

impl SheetReader for Workbook {
    fn read(&mut self) -> Result<bool, SpreadsheetError> {
        self.row.clear();
        let Some(name) = self.sheet_names.get(self.sheet_index) else {
            return Ok(false);
        };
        if self.range.is_none() {
            self.range = Some(self.spreadsheet.worksheet_range(name)?);
            self.next_row = 0;
        }
        let Some(range) = self.range.as_ref() else {
            return Ok(false);
        };
        match range.end() {
            Some((last_row, last_col)) if !range.is_empty() && self.next_row <= last_row => {
                let row = self.next_row;
                self.row.extend((0..=last_col).map(|col| {
                    range.get_value((row, col)).map(to_value).unwrap_or_default()
                }));
                self.next_row += 1;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    fn next_sheet(&mut self) -> Result<bool, SpreadsheetError> {
        self.row.clear();
        self.range = None;
        self.next_row = 0;
        if self.sheet_index < self.sheet_names.len() {
            self.sheet_index += 1;
        }
        Ok(self.sheet_index < self.sheet_names.len())
    }

    fn sheet_name(&self) -> &str {
        self.sheet_names
            .get(self.sheet_index)
            .map(String::as_str)
            .unwrap_or("")
    }

    fn field_count(&self) -> usize {
        self.row.len()
    }

    fn value(&self, column: usize) -> &Value {
        self.row.get(column).unwrap_or(&EMPTY)
    }
}

/// Converts a calamine cell to a raw [`Value`].
///
/// Date-formatted numbers become [`Value::DateTime`]; ISO 8601 strings are
/// parsed when possible and kept as text otherwise.
pub(crate) fn to_value(data: &Data) -> Value {
    match data {
        Data::Empty => Value::Empty,
        Data::Int(value) => Value::Int(*value),
        Data::Float(value) => Value::Float(*value),
        Data::String(value) => Value::String(value.to_owned()),
        Data::Bool(value) => Value::Bool(*value),
        Data::DateTime(value) => value
            .as_datetime()
            .map(Value::DateTime)
            .unwrap_or(Value::Float(value.as_f64())),
        Data::DateTimeIso(value) => parse_iso_datetime(value)
            .map(Value::DateTime)
            .unwrap_or_else(|| Value::String(value.to_owned())),
        Data::DurationIso(value) => parse_iso_duration(value)
            .map(Value::Duration)
            .unwrap_or_else(|| Value::String(value.to_owned())),
        Data::Error(error) => Value::Error(error.to_string()),
    }
}

fn parse_iso_datetime(value: &str) -> Option<NaiveDateTime> {
    if value.contains('T') {
        NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f").ok()
    } else {
        NaiveDate::parse_from_str(value, "%Y-%m-%d")
            .ok()
            .map(|date| date.and_time(chrono::NaiveTime::MIN))
    }
}

/// Parses a time-like ISO 8601 duration; years and months have no fixed length and are rejected.
fn parse_iso_duration(value: &str) -> Option<chrono::Duration> {
    let duration = value.parse::<IsoDuration>().ok()?;
    if duration.year != 0.0 || duration.month != 0.0 {
        return None;
    }
    let seconds = duration.day as f64 * 86_400.0
        + duration.hour as f64 * 3_600.0
        + duration.minute as f64 * 60.0
        + duration.second as f64;
    Some(chrono::Duration::milliseconds((seconds * 1_000.0).round() as i64))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rust_xlsxwriter::Workbook as XlsxWorkbook;
    use std::io::Write;

    /// Writes a two-sheet xlsx file.
    ///
    /// "Primitives" has a title row, a header row and four data rows in
    /// columns A and B. "Third Sheet" leaves rows 1-2 blank and holds
    /// "s3-1".."s3-4" in B3:B6.
    pub(crate) fn write_fixture(path: &Path) {
        let mut workbook = XlsxWorkbook::new();

        let primitives = workbook.add_worksheet().set_name("Primitives").unwrap();
        primitives.write_string(0, 0, "Primitives").unwrap();
        primitives.write_string(1, 0, "Int").unwrap();
        primitives.write_string(1, 1, "String").unwrap();
        primitives.write_number(2, 0, 1).unwrap();
        primitives.write_string(2, 1, "a").unwrap();
        primitives.write_number(3, 0, 2).unwrap();
        primitives.write_string(3, 1, "b").unwrap();
        primitives.write_string(4, 0, "totally_invalid").unwrap();
        primitives.write_string(4, 1, "c").unwrap();
        primitives.write_string(5, 1, "d").unwrap();

        let third = workbook.add_worksheet().set_name("Third Sheet").unwrap();
        for (row, text) in (2u32..).zip(["s3-1", "s3-2", "s3-3", "s3-4"]) {
            third.write_string(row, 1, text).unwrap();
        }

        workbook.save(path).unwrap();
    }

    fn remaining_rows(workbook: &mut Workbook) -> Vec<Vec<Value>> {
        let mut rows = Vec::new();
        while workbook.read().unwrap() {
            rows.push((0..workbook.field_count()).map(|col| workbook.value(col).clone()).collect());
        }
        rows
    }

    #[test]
    fn reads_xlsx_sheets_forward() {
        let directory = tempfile::tempdir().unwrap();
        let path = directory.path().join("primitives.xlsx");
        write_fixture(&path);

        let mut workbook = Workbook::open(&path).unwrap();
        assert_eq!(workbook.sheet_names(), ["Primitives", "Third Sheet"]);
        assert_eq!(workbook.sheet_name(), "Primitives");
        assert_eq!(workbook.field_count(), 0);

        let rows = remaining_rows(&mut workbook);
        assert_eq!(rows.len(), 6);
        assert_eq!(rows[0], vec![Value::from("Primitives"), Value::Empty]);
        assert_eq!(rows[2], vec![Value::Float(1.0), Value::from("a")]);
        assert_eq!(rows[4], vec![Value::from("totally_invalid"), Value::from("c")]);
        assert_eq!(rows[5], vec![Value::Empty, Value::from("d")]);
        assert!(!workbook.read().unwrap());

        assert!(workbook.next_sheet().unwrap());
        assert_eq!(workbook.sheet_name(), "Third Sheet");
        let rows = remaining_rows(&mut workbook);
        assert_eq!(rows.len(), 6);
        assert_eq!(rows[0], vec![Value::Empty, Value::Empty]);
        assert_eq!(rows[1], vec![Value::Empty, Value::Empty]);
        assert_eq!(rows[2], vec![Value::Empty, Value::from("s3-1")]);
        assert_eq!(rows[5], vec![Value::Empty, Value::from("s3-4")]);
        assert_eq!(workbook.value(9), &Value::Empty);

        assert!(!workbook.next_sheet().unwrap());
        assert_eq!(workbook.sheet_name(), "");
        assert!(!workbook.read().unwrap());
        assert_eq!(workbook.field_count(), 0);
    }

    #[test]
    fn next_sheet_skips_unread_rows() {
        let directory = tempfile::tempdir().unwrap();
        let path = directory.path().join("primitives.xlsx");
        write_fixture(&path);

        let mut workbook = Workbook::open(&path).unwrap();
        assert!(workbook.read().unwrap());
        assert!(workbook.next_sheet().unwrap());
        assert!(workbook.read().unwrap());
        assert_eq!(workbook.sheet_name(), "Third Sheet");
        assert_eq!(workbook.value(1), &Value::Empty);
        assert_eq!(remaining_rows(&mut workbook).len(), 5);
    }

    #[test]
    fn unknown_extension_is_rejected() {
        let error = Workbook::open("report.csv").err().unwrap();
        assert!(matches!(error, InvalidFileFormat { ref name } if name == "report.csv"));
        assert!(matches!(Workbook::open("no_extension"), Err(InvalidFileFormat { .. })));
    }

    #[test]
    fn missing_file_reports_format_error() {
        let directory = tempfile::tempdir().unwrap();
        let path = directory.path().join("missing.XLSX");
        assert!(matches!(
            Workbook::open(&path),
            Err(SpreadsheetError::InvalidXlsxFileFormat(_))
        ));
    }

    #[test]
    fn corrupted_file_reports_format_error() {
        let directory = tempfile::tempdir().unwrap();
        let path = directory.path().join("broken.xls");
        File::create(&path)
            .unwrap()
            .write_all(b"definitely not a compound file")
            .unwrap();
        assert!(matches!(
            Workbook::open(&path),
            Err(SpreadsheetError::InvalidXlsFileFormat(_))
        ));
    }

    #[test]
    fn calamine_cells_to_values() {
        assert_eq!(to_value(&Data::Empty), Value::Empty);
        assert_eq!(to_value(&Data::Int(7)), Value::Int(7));
        assert_eq!(to_value(&Data::Float(27.13)), Value::Float(27.13));
        assert_eq!(to_value(&Data::Bool(false)), Value::Bool(false));
        assert_eq!(to_value(&Data::String("s3-1".to_owned())), Value::from("s3-1"));
        assert_eq!(
            to_value(&Data::Error(calamine::CellErrorType::Div0)),
            Value::Error("#DIV/0!".to_owned())
        );
    }

    #[test]
    fn iso_cells_are_parsed() {
        let date = NaiveDate::from_ymd_opt(2017, 12, 31).unwrap();
        assert_eq!(
            to_value(&Data::DateTimeIso("2017-12-31".to_owned())),
            Value::DateTime(date.and_time(chrono::NaiveTime::MIN))
        );
        assert_eq!(
            to_value(&Data::DateTimeIso("2017-12-31T10:30:00".to_owned())),
            Value::DateTime(date.and_hms_opt(10, 30, 0).unwrap())
        );
        assert_eq!(
            to_value(&Data::DateTimeIso("yesterday".to_owned())),
            Value::from("yesterday")
        );
        assert_eq!(
            to_value(&Data::DurationIso("PT1H2M3S".to_owned())),
            Value::Duration(chrono::Duration::seconds(3723))
        );
        assert_eq!(
            to_value(&Data::DurationIso("P1Y".to_owned())),
            Value::from("P1Y")
        );
    }
}
