//! Conversions between spreadsheet-style references ("AZ", "B3") and indexes.
use crate::mapper::range::RangeError;

/// Converts a spreadsheet column name to its 1-based column number.
///
/// Letters are read as a base-26 number where 'A' = 1, case-insensitively:
/// "B" is 2, "AA" is 27, "AZ" is 52 and "BA" is 53.
///
/// # Errors
///
/// Returns [`RangeError::ColumnName`] for an empty name, any non-letter
/// character, or a name too long to fit a `usize`.
pub fn column_name_to_number(name: &str) -> Result<usize, RangeError> {
    let invalid = || RangeError::ColumnName(name.to_owned());
    if name.is_empty() {
        return Err(invalid());
    }
    name.bytes().try_fold(0usize, |number, letter| {
        if !letter.is_ascii_alphabetic() {
            return Err(invalid());
        }
        let digit = (letter.to_ascii_uppercase() - b'A' + 1) as usize;
        number
            .checked_mul(26)
            .and_then(|number| number.checked_add(digit))
            .ok_or_else(invalid)
    })
}

/// Converts a 1-based column number to its spreadsheet column name.
///
/// Returns an empty string for 0.
pub fn column_number_to_name(number: usize) -> String {
    let mut column = number;
    let mut name = Vec::new();
    while column > 0 {
        column -= 1;
        name.push(b'A' + (column % 26) as u8);
        column /= 26;
    }
    name.reverse();
    String::from_utf8(name).unwrap_or_default()
}

/// Converts a column name to a 0-based column index, `None` when blank or invalid.
pub(crate) fn col_to_index(name: &str) -> Option<usize> {
    column_name_to_number(name).ok().map(|number| number - 1)
}

/// Converts a 1-based row number string to a 0-based row index, `None` when blank or 0.
pub(crate) fn row_to_index(number: &str) -> Option<usize> {
    number.parse::<usize>().ok().and_then(|number| number.checked_sub(1))
}

/// Returns the spreadsheet-style reference (e.g. "A1", "B2") for 0-based indexes.
pub fn index_to_reference(row: usize, col: usize) -> String {
    format!("{}{}", column_number_to_name(col + 1), row + 1)
}
