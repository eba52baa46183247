//! # Spreadsheet Reading Module
//!
//! This module defines the forward-only reader contract the extraction engine
//! walks, and its implementations: [`Workbook`] for Excel (.xlsx, .xlsm, .xlam,
//! .xlsb, .xls, .xla) and OpenDocument (.ods) files, and [`MemoryWorkbook`]
//! for rows that already live in memory.
use calamine::OdsError;
use calamine::XlsError;
use calamine::XlsbError;
use calamine::XlsxError;
use thiserror::Error;

pub mod memory;
pub mod reference;
pub mod value;
pub mod workbook;

pub use memory::MemoryWorkbook;
pub use value::Value;
pub use workbook::Spreadsheet;
pub use workbook::Workbook;

/// Errors raised while opening or decoding a spreadsheet.
///
/// These are never classified by the mapper: they travel unchanged to the
/// consumer of the extraction.
#[derive(Error, Debug)]
pub enum SpreadsheetError {
    /// Error in Excel 2007+ format (.xlsx, .xlsm, .xlam)
    #[error("Invalid xlsx file format: {0}")]
    InvalidXlsxFileFormat(#[from] XlsxError),

    /// Error in Excel Binary format (.xlsb)
    #[error("Invalid xlsb file format: {0}")]
    InvalidXlsbFileFormat(#[from] XlsbError),

    /// Error in legacy Excel format (.xls, .xla)
    #[error("Invalid xls file format: {0}")]
    InvalidXlsFileFormat(#[from] XlsError),

    /// Error in OpenDocument format (.ods)
    #[error("Invalid ods file format: {0}")]
    InvalidOdsFileFormat(#[from] OdsError),

    /// Unsupported or unrecognized file format
    #[error("Cannot detect file format for '{name}'")]
    InvalidFileFormat { name: String },
}

/// Forward-only cursor over the sheets and rows of a spreadsheet.
///
/// A freshly opened reader is positioned on its first sheet, before the first
/// row. Sheets and rows can only be visited once, in file order.
pub trait SheetReader {
    /// Advances to the next row of the current sheet.
    ///
    /// Returns `false` once the current sheet has no more rows.
    fn read(&mut self) -> Result<bool, SpreadsheetError>;

    /// Advances to the next sheet, positioned before its first row.
    ///
    /// Returns `false` when there is no further sheet.
    fn next_sheet(&mut self) -> Result<bool, SpreadsheetError>;

    /// Name of the current sheet (empty when the workbook has no sheets).
    fn sheet_name(&self) -> &str;

    /// Number of columns reported for the current row.
    fn field_count(&self) -> usize;

    /// Raw value at a 0-based column of the current row.
    ///
    /// Columns beyond [`field_count`](Self::field_count) read as [`Value::Empty`].
    fn value(&self, column: usize) -> &Value;
}

impl<R: SheetReader + ?Sized> SheetReader for &mut R {
    fn read(&mut self) -> Result<bool, SpreadsheetError> {
        (**self).read()
    }

    fn next_sheet(&mut self) -> Result<bool, SpreadsheetError> {
        (**self).next_sheet()
    }

    fn sheet_name(&self) -> &str {
        (**self).sheet_name()
    }

    fn field_count(&self) -> usize {
        (**self).field_count()
    }

    fn value(&self, column: usize) -> &Value {
        (**self).value(column)
    }
}

/// Shared blank value handed out for missing cells.
pub(crate) static EMPTY: Value = Value::Empty;
