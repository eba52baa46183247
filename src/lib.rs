//! # Rusty Mapper
//!
//! Maps the rows of Excel and OpenDocument spreadsheets onto typed Rust records.
//!
//! ## Features
//!
//! - **Multi-format support**: read Excel files (`.xls`, `.xlsx`, `.xlsm`, `.xlsb`, `.xla`, `.xlam`)
//!   and OpenDocument spreadsheet files (`.ods`)
//! - **Typed columns**: bind a column to a record field; the conversion is chosen by the field type
//! - **Custom conversions**: replace a column's converter, or hand the raw value to an action
//! - **Row and cell ranges**: read rows `3..=6`, or only the cells inside `B3:D10`
//! - **Error handling**: observe every cell that fails to convert, and choose per column whether
//!   the failure is skipped or aborts the extraction
//! - **Lazy extraction**: records are produced one at a time as the caller pulls them
//!
//! ## Example
//!
//! ```no_run
//! use rusty_mapper::read_rows;
//! use rusty_mapper::RowMapper;
//!
//! #[derive(Debug, Default)]
//! struct Order {
//!     id: Option<i64>,
//!     customer: String,
//!     total: Option<f64>,
//! }
//!
//! let mut mapper = RowMapper::<Order>::new();
//! mapper.map_column("A", |order: &mut Order| &mut order.id)?;
//! mapper.map_column("B", |order: &mut Order| &mut order.customer)?;
//! mapper.map_column(3, |order: &mut Order| &mut order.total)?.ignore_errors(false);
//! mapper.from_rows(2, None);
//! mapper.on_error(|error| eprintln!("{}: {}", error.cell, error.message));
//!
//! for order in read_rows("orders.xlsx", Some("Orders"), &mapper)? {
//!     println!("{:?}", order?);
//! }
//! # Ok::<(), rusty_mapper::RustyMapperError>(())
//! ```
pub mod error;
pub mod extract;
pub mod mapper;
pub mod spreadsheet;

pub use error::RustyMapperError;
pub use extract::read_all_rows;
pub use extract::read_rows;
pub use extract::rows_from;
pub use extract::Rows;
pub use mapper::convert::ConvertError;
pub use mapper::convert::FromCell;
pub use mapper::CellAddress;
pub use mapper::ConversionError;
pub use mapper::RowMapper;
pub use spreadsheet::reference::column_name_to_number;
pub use spreadsheet::SheetReader;
pub use spreadsheet::Value;
