use crate::spreadsheet::reference::col_to_index;
use crate::spreadsheet::reference::row_to_index;
use regex::Regex;
use std::str::FromStr;
use thiserror::Error;

/// Errors related to spreadsheet-style range and column parsing.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RangeError {
    #[error("Invalid range format '{0}'")]
    FormatError(String),

    #[error("Invalid column name '{0}'")]
    ColumnName(String),

    #[error("Invalid column number {0}, column numbers start at 1")]
    ColumnNumber(i64),
}

/// Represents a spreadsheet-style cell range with optional boundaries.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct CellRange {
    /// Lower row bound (0-based index), None for unbounded
    pub row_lower_bound: Option<usize>,
    /// Upper row bound (0-based index), None for unbounded
    pub row_upper_bound: Option<usize>,
    /// Lower column bound (0-based index), None for unbounded
    pub col_lower_bound: Option<usize>,
    /// Upper column bound (0-based index), None for unbounded
    pub col_upper_bound: Option<usize>,
}

impl CellRange {
    /// Parses a spreadsheet-style range ("A1", "B2:C5", "A:C", "3:10").
    ///
    /// A single reference has no upper bound: "B3" selects everything from B3
    /// rightwards and downwards.
    pub fn parse(value: &str) -> Result<Self, RangeError> {
        let pattern = Regex::new(r"^([A-Z]*)(\d*)(:([A-Z]*)(\d*))?$").expect("Hardcode regex pattern");
        let value = value.trim().to_ascii_uppercase();
        let captures = pattern
            .captures(value.as_str())
            .filter(|_| !value.is_empty())
            .ok_or_else(|| RangeError::FormatError(value.to_owned()))?;
        // A present but unusable part (row 0, oversized column) is an error, not an open bound.
        let bound = |index: usize, to_index: fn(&str) -> Option<usize>| match captures
            .get(index)
            .map(|matcher| matcher.as_str())
            .filter(|text| !text.is_empty())
        {
            Some(text) => to_index(text)
                .map(Some)
                .ok_or_else(|| RangeError::FormatError(value.to_owned())),
            None => Ok(None),
        };
        Ok(CellRange {
            col_lower_bound: bound(1, col_to_index)?,
            row_lower_bound: bound(2, row_to_index)?,
            col_upper_bound: bound(4, col_to_index)?,
            row_upper_bound: bound(5, row_to_index)?,
        })
    }

    /// Checks if a row is inside the row bounds.
    pub fn contains_row(&self, row: usize) -> bool {
        self.row_lower_bound.map_or(true, |lower| lower <= row)
            && self.row_upper_bound.map_or(true, |upper| row <= upper)
    }

    /// Checks if a column is inside the column bounds.
    pub fn contains_col(&self, col: usize) -> bool {
        self.col_lower_bound.map_or(true, |lower| lower <= col)
            && self.col_upper_bound.map_or(true, |upper| col <= upper)
    }

    /// Checks if a cell at (row, col) is within the range.
    pub fn contains(&self, row: usize, col: usize) -> bool {
        self.contains_row(row) && self.contains_col(col)
    }
}

impl FromStr for CellRange {
    type Err = RangeError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse(value)
    }
}

impl TryFrom<&str> for CellRange {
    type Error = RangeError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}
