//! In-memory workbook, walked with the same forward-only rules as a file.
use crate::spreadsheet::SheetReader;
use crate::spreadsheet::SpreadsheetError;
use crate::spreadsheet::Value;
use crate::spreadsheet::EMPTY;

/// A sheet held in memory: a name plus rows of raw values.
#[derive(Clone, Debug, Default)]
struct MemorySheet {
    name: String,
    rows: Vec<Vec<Value>>,
    /// Widest row of the sheet
    field_count: usize,
}

/// Workbook built from rows already in memory.
///
/// Every row of a sheet reports the sheet's widest row as its field count;
/// shorter rows read as [`Value::Empty`] past their end.
///
/// ```
/// use rusty_mapper::spreadsheet::MemoryWorkbook;
///
/// let workbook = MemoryWorkbook::new()
///     .sheet("Primitives", vec![vec!["id".into(), "name".into()], vec![1.into(), "a".into()]])
///     .sheet("Empty", vec![]);
/// assert_eq!(workbook.sheet_names(), vec!["Primitives", "Empty"]);
/// ```
#[derive(Clone, Debug, Default)]
pub struct MemoryWorkbook {
    sheets: Vec<MemorySheet>,
    sheet_index: usize,
    /// Index of the current row in the current sheet, `None` before the first read
    row_index: Option<usize>,
}

impl MemoryWorkbook {
    /// Creates a workbook without sheets.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a sheet, returning the workbook for chaining.
    pub fn sheet<N>(mut self, name: N, rows: Vec<Vec<Value>>) -> Self
    where
        N: Into<String>,
    {
        let field_count = rows.iter().map(Vec::len).max().unwrap_or(0);
        self.sheets.push(MemorySheet {
            name: name.into(),
            rows,
            field_count,
        });
        self
    }

    /// Names of all sheets in insertion order.
    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|sheet| sheet.name.as_str()).collect()
    }

    /// Moves the cursor back to the first sheet.
    pub fn rewind(&mut self) {
        self.sheet_index = 0;
        self.row_index = None;
    }

    fn current_row(&self) -> Option<&Vec<Value>> {
        let sheet = self.sheets.get(self.sheet_index)?;
        sheet.rows.get(self.row_index?)
    }
}

impl SheetReader for MemoryWorkbook {
    fn read(&mut self) -> Result<bool, SpreadsheetError> {
        let Some(sheet) = self.sheets.get(self.sheet_index) else {
            return Ok(false);
        };
        let next = self.row_index.map_or(0, |row| row + 1);
        if next < sheet.rows.len() {
            self.row_index = Some(next);
            Ok(true)
        } else {
            self.row_index = Some(sheet.rows.len());
            Ok(false)
        }
    }

    fn next_sheet(&mut self) -> Result<bool, SpreadsheetError> {
        self.row_index = None;
        if self.sheet_index < self.sheets.len() {
            self.sheet_index += 1;
        }
        Ok(self.sheet_index < self.sheets.len())
    }

    fn sheet_name(&self) -> &str {
        self.sheets
            .get(self.sheet_index)
            .map(|sheet| sheet.name.as_str())
            .unwrap_or("")
    }

    fn field_count(&self) -> usize {
        match self.current_row() {
            Some(_) => self.sheets[self.sheet_index].field_count,
            None => 0,
        }
    }

    fn value(&self, column: usize) -> &Value {
        self.current_row()
            .and_then(|row| row.get(column))
            .unwrap_or(&EMPTY)
    }
}
