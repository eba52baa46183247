//! # Extraction Engine
//!
//! Walks a [`SheetReader`] forward, one sheet and one row at a time, and turns
//! every requested row into a record through a [`RowMapper`]. Records are
//! produced lazily: nothing is read from the workbook until the caller pulls
//! the next item, and dropping the iterator releases the reader.
use crate::error::RustyMapperError;
use crate::mapper::address::same_sheet;
use crate::mapper::CellAddress;
use crate::mapper::ConversionError;
use crate::mapper::RowMapper;
use crate::spreadsheet::SheetReader;
use crate::spreadsheet::Workbook;
use std::iter::FusedIterator;
use std::path::Path;
use tracing::debug;
use tracing::trace;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum State {
    /// Looking for a sheet to read
    Seeking,
    /// Yielding rows of the current sheet
    InSheet,
    Done,
}

/// Lazy sequence of records mapped from the rows of a reader.
///
/// Yields `Err` once when a cell that does not ignore errors fails to convert,
/// or when the reader fails, and ends right after.
pub struct Rows<'m, T, R> {
    reader: R,
    mapper: &'m RowMapper<T>,
    sheet: Option<String>,
    /// Mapped columns, ascending
    columns: Vec<usize>,
    state: State,
    /// Index of the next row of the current sheet
    next_row: usize,
    /// Reused address of the cell being mapped
    cell: CellAddress,
}

/// Maps the rows of `reader` onto records.
///
/// With `sheet`, only the first sheet of that name (ignoring case) is read; a
/// missing sheet yields nothing. Without it, every sheet is read in order and
/// the records form one flat sequence.
///
/// ```
/// use rusty_mapper::extract::rows_from;
/// use rusty_mapper::mapper::RowMapper;
/// use rusty_mapper::spreadsheet::MemoryWorkbook;
///
/// #[derive(Default)]
/// struct Item {
///     id: Option<i64>,
/// }
///
/// let workbook = MemoryWorkbook::new().sheet("Items", vec![vec!["id".into()], vec![7.into()]]);
/// let mut mapper = RowMapper::<Item>::new();
/// mapper.map_column("A", |item: &mut Item| &mut item.id).unwrap();
/// mapper.from_rows(2, None);
///
/// let ids: Vec<Option<i64>> = rows_from(workbook, Some("items"), &mapper)
///     .map(|item| item.map(|item| item.id))
///     .collect::<Result<_, _>>()
///     .unwrap();
/// assert_eq!(ids, vec![Some(7)]);
/// ```
pub fn rows_from<'m, T, R>(reader: R, sheet: Option<&str>, mapper: &'m RowMapper<T>) -> Rows<'m, T, R>
where
    R: SheetReader,
{
    Rows {
        reader,
        mapper,
        sheet: sheet.map(str::to_owned),
        columns: mapper.columns(),
        state: State::Seeking,
        next_row: 0,
        cell: CellAddress::default(),
    }
}

/// Opens a spreadsheet file and maps the rows of `sheet`, or of every sheet.
///
/// Opening failures (missing file, unknown extension, corrupted container)
/// are returned here, before any row is read.
pub fn read_rows<'m, T, P>(
    path: P,
    sheet: Option<&str>,
    mapper: &'m RowMapper<T>,
) -> Result<Rows<'m, T, Workbook>, RustyMapperError>
where
    P: AsRef<Path>,
{
    let workbook = Workbook::open(path)?;
    Ok(rows_from(workbook, sheet, mapper))
}

/// Opens a spreadsheet file and maps the rows of all its sheets.
pub fn read_all_rows<'m, T, P>(path: P, mapper: &'m RowMapper<T>) -> Result<Rows<'m, T, Workbook>, RustyMapperError>
where
    P: AsRef<Path>,
{
    read_rows(path, None, mapper)
}

impl<'m, T, R: SheetReader> Rows<'m, T, R> {
    /// Gives the reader back, positioned wherever extraction stopped.
    pub fn into_reader(self) -> R {
        self.reader
    }

    fn is_wanted_sheet(&self) -> bool {
        self.sheet
            .as_deref()
            .map_or(true, |sheet| same_sheet(sheet, self.reader.sheet_name()))
    }

    fn enter_sheet(&mut self) {
        self.cell.sheet.clear();
        self.cell.sheet.push_str(self.reader.sheet_name());
        self.next_row = 0;
        self.state = State::InSheet;
        trace!(sheet = %self.cell.sheet, "reading sheet");
    }

    fn advance(&mut self) -> Result<Option<T>, RustyMapperError> {
        loop {
            match self.state {
                State::Done => return Ok(None),
                State::Seeking => {
                    if self.is_wanted_sheet() {
                        self.enter_sheet();
                    } else if !self.reader.next_sheet()? {
                        debug!(sheet = ?self.sheet, "sheet not found");
                        self.state = State::Done;
                    }
                }
                State::InSheet => {
                    if !self.reader.read()? {
                        // A named sheet is read once; later sheets are never visited.
                        self.state = if self.sheet.is_none() && self.reader.next_sheet()? {
                            State::Seeking
                        } else {
                            State::Done
                        };
                        continue;
                    }
                    let row_index = self.next_row;
                    self.next_row += 1;
                    if !self.mapper.is_requested_row(row_index) {
                        continue;
                    }
                    if let Some(record) = self.map_row(row_index)? {
                        return Ok(Some(record));
                    }
                }
            }
        }
    }

    /// Builds the record of the current row, `None` when the row is skipped as empty.
    fn map_row(&mut self, row_index: usize) -> Result<Option<T>, RustyMapperError> {
        let mapper = self.mapper;
        let field_count = self.reader.field_count();
        self.cell.row_index = row_index;

        if mapper.skips_empty_rows() && self.is_empty_row(field_count) {
            return Ok(None);
        }

        let mut record = mapper.create_instance();
        for &column in self.columns.iter().take_while(|&&column| column < field_count) {
            self.cell.column_index = Some(column);
            if !mapper.is_requested_range(&self.cell) {
                continue;
            }
            let Some(cell_map) = mapper.try_get_cell_map(column) else {
                continue;
            };
            let value = mapper.normalize(self.reader.value(column));
            if let Err(source) = cell_map.set_value(&mut record, value) {
                let error = ConversionError {
                    cell: self.cell.clone(),
                    message: source.to_string(),
                    raw_value: value.clone(),
                };
                debug!(
                    cell = %error.cell,
                    message = %error.message,
                    ignored = cell_map.ignore_errors(),
                    "cannot convert cell"
                );
                mapper.report(&error);
                if !cell_map.ignore_errors() {
                    return Err(RustyMapperError::Conversion {
                        cell: error.cell,
                        source,
                    });
                }
            }
        }
        Ok(Some(record))
    }

    fn is_empty_row(&mut self, field_count: usize) -> bool {
        let mapper = self.mapper;
        for &column in self.columns.iter().take_while(|&&column| column < field_count) {
            self.cell.column_index = Some(column);
            if mapper.is_requested_range(&self.cell) && !mapper.normalize(self.reader.value(column)).is_empty() {
                return false;
            }
        }
        true
    }
}

impl<'m, T, R: SheetReader> Iterator for Rows<'m, T, R> {
    type Item = Result<T, RustyMapperError>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.advance() {
            Ok(record) => record.map(Ok),
            Err(error) => {
                self.state = State::Done;
                Some(Err(error))
            }
        }
    }
}

impl<'m, T, R: SheetReader> FusedIterator for Rows<'m, T, R> {}
