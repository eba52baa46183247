use crate::mapper::convert::ConvertError;
use crate::mapper::range::RangeError;
use crate::mapper::CellAddress;
use crate::spreadsheet::SpreadsheetError;
use thiserror::Error;

/// Main error type of the row mapper.
/// Aggregates reader failures, configuration failures and conversion failures re-raised from a column.
#[derive(Error, Debug)]
pub enum RustyMapperError {
    /// A column that does not ignore errors failed to convert
    #[error("Cannot convert cell {cell}: {source}")]
    Conversion {
        cell: CellAddress,
        #[source]
        source: ConvertError,
    },

    #[error("{0}")]
    Spreadsheet(#[from] SpreadsheetError),

    #[error("{0}")]
    Range(#[from] RangeError),
}

impl RustyMapperError {
    /// Address of the failing cell, for conversion errors.
    pub fn cell(&self) -> Option<&CellAddress> {
        match self {
            RustyMapperError::Conversion { cell, .. } => Some(cell),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::error::Error as _;

    #[test]
    fn conversion_error_keeps_cell_and_source() {
        let error = RustyMapperError::Conversion {
            cell: CellAddress::new("Primitives", 4, 0),
            source: ConvertError::Format {
                value: "totally_invalid".to_owned(),
                target: "i32",
            },
        };
        assert_eq!(error.cell(), Some(&CellAddress::new("Primitives", 4, 0)));
        assert!(error.to_string().starts_with("Cannot convert cell [Primitives]!A5: "));
        assert!(error.source().is_some());
    }

    #[test]
    fn wraps_range_errors() {
        let error: RustyMapperError = RangeError::ColumnNumber(0).into();
        assert_eq!(error.cell(), None);
        assert_eq!(error.to_string(), "Invalid column number 0, column numbers start at 1");
    }
}
