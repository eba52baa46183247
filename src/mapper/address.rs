use crate::spreadsheet::reference::column_number_to_name;
use std::fmt::Display;

/// Location of a cell (or a whole row) in a workbook.
///
/// Indexes are 0-based; [`row`](Self::row) and [`column`](Self::column) give
/// the 1-based numbers a spreadsheet shows. Sheet names compare
/// case-insensitively, and a row-only address never equals a cell address.
#[derive(Clone, Debug, Default)]
pub struct CellAddress {
    /// Sheet name as reported by the reader
    pub sheet: String,
    /// Row index (0-based)
    pub row_index: usize,
    /// Column index (0-based), `None` for a whole row
    pub column_index: Option<usize>,
}

impl CellAddress {
    /// Creates the address of a single cell.
    pub fn new<S: Into<String>>(sheet: S, row_index: usize, column_index: usize) -> Self {
        CellAddress {
            sheet: sheet.into(),
            row_index,
            column_index: Some(column_index),
        }
    }

    /// Creates the address of a whole row.
    pub fn row_only<S: Into<String>>(sheet: S, row_index: usize) -> Self {
        CellAddress {
            sheet: sheet.into(),
            row_index,
            column_index: None,
        }
    }

    /// 1-based row number.
    #[inline]
    pub fn row(&self) -> usize {
        self.row_index + 1
    }

    /// 1-based column number, `None` for a whole row.
    #[inline]
    pub fn column(&self) -> Option<usize> {
        self.column_index.map(|index| index + 1)
    }

    /// Spreadsheet-style column name ("A", "AZ"), `None` for a whole row.
    pub fn column_name(&self) -> Option<String> {
        self.column().map(column_number_to_name)
    }

    /// Checks the sheet name, ignoring case.
    pub fn is_sheet(&self, name: &str) -> bool {
        same_sheet(&self.sheet, name)
    }
}

/// Compares two sheet names, ignoring case.
pub(crate) fn same_sheet(left: &str, right: &str) -> bool {
    left.chars()
        .flat_map(char::to_lowercase)
        .eq(right.chars().flat_map(char::to_lowercase))
}

impl PartialEq for CellAddress {
    fn eq(&self, other: &Self) -> bool {
        self.row_index == other.row_index
            && self.column_index == other.column_index
            && same_sheet(&self.sheet, &other.sheet)
    }
}

impl Eq for CellAddress {}

impl Display for CellAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.column_name() {
            Some(column) => write!(f, "[{}]!{}{}", self.sheet, column, self.row()),
            None => write!(f, "[{}]!{}:{}", self.sheet, self.row(), self.row()),
        }
    }
}
