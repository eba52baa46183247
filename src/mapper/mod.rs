//! # Row Mapping Module
//!
//! A [`RowMapper`] describes how spreadsheet rows become records: which rows
//! and cells are read, which column feeds which field, how raw values are
//! converted, and who hears about cells that fail to convert.
use crate::mapper::binding::ActionCellMapper;
use crate::mapper::binding::CellMap;
use crate::mapper::binding::TypedCellMapper;
use crate::mapper::convert::ConvertError;
use crate::mapper::convert::FromCell;
use crate::mapper::range::CellRange;
use crate::mapper::range::RangeError;
use crate::spreadsheet::reference::column_name_to_number;
use crate::spreadsheet::Value;
use crate::spreadsheet::EMPTY;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::collections::HashSet;
use std::fmt::Debug;
use tracing::debug;

pub mod address;
pub mod binding;
pub mod convert;
pub mod range;

pub use address::CellAddress;

type RowFilter = Box<dyn Fn(usize) -> bool>;
type RangeFilter = Box<dyn Fn(&CellAddress) -> bool>;
type InstanceFactory<T> = Box<dyn Fn() -> T>;
type ErrorObserver = Box<dyn Fn(&ConversionError)>;

/// Report of a cell that failed to convert, handed to the error observer.
#[derive(Clone, Debug, PartialEq)]
pub struct ConversionError {
    /// Where the failure occurred
    pub cell: CellAddress,
    /// Human-readable description of the failure
    pub message: String,
    /// The offending raw value
    pub raw_value: Value,
}

/// Something that names a column: a 1-based number or a letter name.
pub trait ColumnKey {
    /// Resolves to a 0-based column index.
    fn column_index(&self) -> Result<usize, RangeError>;
}

impl ColumnKey for usize {
    fn column_index(&self) -> Result<usize, RangeError> {
        self.checked_sub(1).ok_or(RangeError::ColumnNumber(0))
    }
}

impl ColumnKey for u32 {
    fn column_index(&self) -> Result<usize, RangeError> {
        (*self as usize).column_index()
    }
}

impl ColumnKey for i32 {
    fn column_index(&self) -> Result<usize, RangeError> {
        usize::try_from(*self)
            .map_err(|_| RangeError::ColumnNumber((*self).into()))?
            .column_index()
    }
}

impl ColumnKey for &str {
    fn column_index(&self) -> Result<usize, RangeError> {
        Ok(column_name_to_number(self)? - 1)
    }
}

impl ColumnKey for String {
    fn column_index(&self) -> Result<usize, RangeError> {
        self.as_str().column_index()
    }
}

impl ColumnKey for char {
    fn column_index(&self) -> Result<usize, RangeError> {
        let mut buffer = [0u8; 4];
        let name: &str = self.encode_utf8(&mut buffer);
        name.column_index()
    }
}

/// Maps spreadsheet rows onto instances of `T`.
///
/// Configure it once, then hand it to [`rows_from`](crate::extract::rows_from)
/// or [`read_rows`](crate::extract::read_rows); extraction only reads it.
/// Every configuration call replaces the previous setting of the same kind.
///
/// ```
/// use rusty_mapper::mapper::RowMapper;
///
/// #[derive(Default)]
/// struct Primitive {
///     int_value: Option<i32>,
///     string_value: String,
/// }
///
/// let mut mapper = RowMapper::<Primitive>::new();
/// mapper.map_column(1, |p: &mut Primitive| &mut p.int_value).unwrap();
/// mapper.map_column("B", |p: &mut Primitive| &mut p.string_value).unwrap();
/// mapper.from_rows(3, Some(6));
///
/// assert!(mapper.is_requested_row(2));
/// assert!(!mapper.is_requested_row(6));
/// assert_eq!(mapper.columns(), vec![0, 1]);
/// ```
pub struct RowMapper<T> {
    mapped_columns: HashMap<usize, CellMap<T>>,
    row_filter: RowFilter,
    range_filter: RangeFilter,
    instance_factory: InstanceFactory<T>,
    error_observer: Option<ErrorObserver>,
    /// String literals read as empty cells
    nulls: HashSet<String>,
    skip_empty_rows: bool,
}

impl<T: Default + 'static> RowMapper<T> {
    /// Creates a mapper building records with `T::default()`.
    pub fn new() -> Self {
        Self::with_factory(T::default)
    }
}

impl<T: Default + 'static> Default for RowMapper<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: 'static> RowMapper<T> {
    /// Creates a mapper building records with `factory`.
    pub fn with_factory<F>(factory: F) -> Self
    where
        F: Fn() -> T + 'static,
    {
        RowMapper {
            mapped_columns: HashMap::new(),
            row_filter: Box::new(|_| true),
            range_filter: Box::new(|_| true),
            instance_factory: Box::new(factory),
            error_observer: None,
            nulls: HashSet::new(),
            skip_empty_rows: false,
        }
    }

    /// Maps a column to a record field, converting with the field's [`FromCell`].
    ///
    /// `column` is a 1-based number or a letter name ("A", "AZ"). Mapping a
    /// column again replaces its earlier binding.
    pub fn map_column<K, P, A>(&mut self, column: K, accessor: A) -> Result<TypedCellMapper<'_, T, P, A>, RangeError>
    where
        K: ColumnKey,
        P: FromCell + 'static,
        A: Fn(&mut T) -> &mut P + Clone + 'static,
    {
        let column_index = column.column_index()?;
        let cell_map = self.insert(CellMap::typed(column_index, accessor.clone()));
        Ok(TypedCellMapper::new(cell_map, accessor))
    }

    /// Maps a column to an action receiving the raw cell value.
    ///
    /// The action does its own conversion; any error it returns is treated
    /// like a conversion error of this column.
    pub fn map_column_with<K, F>(&mut self, column: K, action: F) -> Result<ActionCellMapper<'_, T>, RangeError>
    where
        K: ColumnKey,
        F: Fn(&mut T, &Value) -> Result<(), ConvertError> + 'static,
    {
        let column_index = column.column_index()?;
        let cell_map = self.insert(CellMap::action(column_index, action));
        Ok(ActionCellMapper::new(cell_map))
    }

    fn insert(&mut self, cell_map: CellMap<T>) -> &mut CellMap<T> {
        match self.mapped_columns.entry(cell_map.column_index()) {
            Entry::Occupied(mut entry) => {
                debug!(column = cell_map.column_index(), "replacing column binding");
                entry.insert(cell_map);
                entry.into_mut()
            }
            Entry::Vacant(entry) => entry.insert(cell_map),
        }
    }

    /// Reads rows `start..=end` (1-based); without `end`, every row from `start` on.
    ///
    /// A `start` of 0 is read as 1, and an `end` before `start` selects nothing.
    pub fn from_rows(&mut self, start: usize, end: Option<usize>) -> &mut Self {
        let lower = start.saturating_sub(1);
        self.row_filter = match end {
            Some(end) => {
                let upper = end.checked_sub(1);
                Box::new(move |row| lower <= row && upper.is_some_and(|upper| row <= upper))
            }
            None => Box::new(move |row| lower <= row),
        };
        self
    }

    /// Reads only cells accepted by `predicate`.
    pub fn range<F>(&mut self, predicate: F) -> &mut Self
    where
        F: Fn(&CellAddress) -> bool + 'static,
    {
        self.range_filter = Box::new(predicate);
        self
    }

    /// Reads only cells inside a spreadsheet-style range such as "B3:D10".
    pub fn cells(&mut self, range: &str) -> Result<&mut Self, RangeError> {
        let range = CellRange::parse(range)?;
        Ok(self.range(move |cell| {
            range.contains_row(cell.row_index) && cell.column_index.is_some_and(|col| range.contains_col(col))
        }))
    }

    /// Registers the observer told about every cell that fails to convert.
    pub fn on_error<F>(&mut self, observer: F) -> &mut Self
    where
        F: Fn(&ConversionError) + 'static,
    {
        self.error_observer = Some(Box::new(observer));
        self
    }

    /// Replaces the factory creating one record per row.
    pub fn instance_factory<F>(&mut self, factory: F) -> &mut Self
    where
        F: Fn() -> T + 'static,
    {
        self.instance_factory = Box::new(factory);
        self
    }

    /// Reads string cells equal to one of `literals` as empty cells.
    pub fn nulls<I, S>(&mut self, literals: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.nulls = literals.into_iter().map(Into::into).collect();
        self
    }

    /// Skips rows whose requested, mapped cells are all empty.
    pub fn skip_empty_rows(&mut self, skip: bool) -> &mut Self {
        self.skip_empty_rows = skip;
        self
    }
}

impl<T> RowMapper<T> {
    /// Checks a 0-based row index against the row filter.
    #[inline]
    pub fn is_requested_row(&self, row_index: usize) -> bool {
        (self.row_filter)(row_index)
    }

    /// Checks a cell against the range filter.
    #[inline]
    pub fn is_requested_range(&self, cell: &CellAddress) -> bool {
        (self.range_filter)(cell)
    }

    /// Looks up the binding of a 0-based column index.
    #[inline]
    pub fn try_get_cell_map(&self, column_index: usize) -> Option<&CellMap<T>> {
        self.mapped_columns.get(&column_index)
    }

    /// Mapped 0-based column indexes, in ascending order.
    pub fn columns(&self) -> Vec<usize> {
        let mut columns: Vec<usize> = self.mapped_columns.keys().copied().collect();
        columns.sort_unstable();
        columns
    }

    pub(crate) fn create_instance(&self) -> T {
        (self.instance_factory)()
    }

    pub(crate) fn report(&self, error: &ConversionError) {
        if let Some(observer) = &self.error_observer {
            observer(error);
        }
    }

    /// Swaps null literals for the empty value.
    #[inline]
    pub(crate) fn normalize<'v>(&self, value: &'v Value) -> &'v Value {
        match value {
            Value::String(text) if self.nulls.contains(text) => &EMPTY,
            value => value,
        }
    }

    #[inline]
    pub(crate) fn skips_empty_rows(&self) -> bool {
        self.skip_empty_rows
    }
}

impl<T> Debug for RowMapper<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RowMapper")
            .field("columns", &self.columns())
            .field("has_error_observer", &self.error_observer.is_some())
            .field("nulls", &self.nulls)
            .field("skip_empty_rows", &self.skip_empty_rows)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapper::binding::CellMapKind;
    use pretty_assertions::assert_eq;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Debug, Default)]
    struct Primitive {
        int_value: Option<i32>,
        string_value: String,
    }

    #[test]
    fn from_rows_sets_row_range() {
        let mut mapper = RowMapper::<Primitive>::new();
        mapper.from_rows(3, Some(6));

        assert!(!mapper.is_requested_row(0));
        assert!(!mapper.is_requested_row(1));

        assert!(mapper.is_requested_row(2));
        assert!(mapper.is_requested_row(3));
        assert!(mapper.is_requested_row(5));

        assert!(!mapper.is_requested_row(6));
        assert!(!mapper.is_requested_row(10));
    }

    #[test]
    fn without_rows_accepts_all_rows() {
        let mapper = RowMapper::<Primitive>::new();

        assert!(mapper.is_requested_row(0));
        assert!(mapper.is_requested_row(2));
        assert!(mapper.is_requested_row(300));
    }

    #[test]
    fn with_first_row_is_open_ended() {
        let mut mapper = RowMapper::<Primitive>::new();
        mapper.from_rows(3, None);

        assert!(!mapper.is_requested_row(0));
        assert!(!mapper.is_requested_row(1));

        assert!(mapper.is_requested_row(2));
        assert!(mapper.is_requested_row(300));
    }

    #[test]
    fn last_from_rows_wins() {
        let mut mapper = RowMapper::<Primitive>::new();
        mapper.from_rows(3, Some(4)).from_rows(10, None);
        assert!(!mapper.is_requested_row(2));
        assert!(mapper.is_requested_row(9));

        mapper.from_rows(0, Some(1));
        assert!(mapper.is_requested_row(0));
        assert!(!mapper.is_requested_row(1));

        mapper.from_rows(5, Some(2));
        assert!((0..10).all(|row| !mapper.is_requested_row(row)));
    }

    #[test]
    fn custom_range_filters_cells() {
        let sheet = "Primitives";
        let mut mapper = RowMapper::<Primitive>::new();
        mapper.range(move |cell| cell.sheet == sheet && cell.column() == Some(1));

        assert!(mapper.is_requested_range(&CellAddress::new(sheet, 1, 0)));
        assert!(mapper.is_requested_range(&CellAddress::new(sheet, 100, 0)));

        assert!(!mapper.is_requested_range(&CellAddress::new("Third sheet", 1, 0)));
        assert!(!mapper.is_requested_range(&CellAddress::new(sheet, 1, 30)));
    }

    #[test]
    fn range_is_independent_of_rows() {
        let mut mapper = RowMapper::<Primitive>::new();
        mapper.from_rows(3, Some(6));
        assert!(mapper.is_requested_range(&CellAddress::new("Any", 0, 0)));
    }

    #[test]
    fn cells_builds_range_from_reference() {
        let mut mapper = RowMapper::<Primitive>::new();
        mapper.cells("A3:B6").unwrap();
        assert!(mapper.is_requested_range(&CellAddress::new("S", 2, 0)));
        assert!(mapper.is_requested_range(&CellAddress::new("S", 5, 1)));
        assert!(!mapper.is_requested_range(&CellAddress::new("S", 6, 1)));
        assert!(!mapper.is_requested_range(&CellAddress::new("S", 3, 2)));
        assert!(!mapper.is_requested_range(&CellAddress::row_only("S", 3)));
        assert!(mapper.cells("A-3").is_err());
    }

    #[test]
    fn map_column_number_adds_cell_map() {
        let mut mapper = RowMapper::<Primitive>::new();
        let column = 1;
        let column_index = column - 1;
        mapper.map_column(column, |f: &mut Primitive| &mut f.int_value).unwrap();
        let cell_map = mapper.try_get_cell_map(column_index).unwrap();
        assert_eq!(cell_map.column_index(), column_index);
        assert_eq!(cell_map.kind(), CellMapKind::Typed);
    }

    #[test]
    fn map_column_name_adds_cell_map() {
        let mut mapper = RowMapper::<Primitive>::new();
        let handle = mapper.map_column("AZ", |f: &mut Primitive| &mut f.int_value).unwrap();
        assert_eq!(handle.column_index(), 51);
        assert_eq!(mapper.try_get_cell_map(51).map(CellMap::column_index), Some(51));
        assert!(mapper.try_get_cell_map(0).is_none());
    }

    #[test]
    fn invalid_columns_are_rejected() {
        let mut mapper = RowMapper::<Primitive>::new();
        assert_eq!(
            mapper.map_column(0usize, |f: &mut Primitive| &mut f.int_value).err(),
            Some(RangeError::ColumnNumber(0))
        );
        assert_eq!(
            mapper.map_column(-2, |f: &mut Primitive| &mut f.int_value).err(),
            Some(RangeError::ColumnNumber(-2))
        );
        assert_eq!(
            mapper.map_column("A1", |f: &mut Primitive| &mut f.int_value).err(),
            Some(RangeError::ColumnName("A1".to_owned()))
        );
        assert!(mapper.columns().is_empty());
    }

    #[test]
    fn remapping_a_column_replaces_binding() {
        let mut mapper = RowMapper::<Primitive>::new();
        mapper
            .map_column('b', |f: &mut Primitive| &mut f.int_value)
            .unwrap()
            .ignore_errors(false);
        mapper
            .map_column_with(2u32, |f: &mut Primitive, raw: &Value| {
                f.string_value = raw.to_string();
                Ok(())
            })
            .unwrap();

        let cell_map = mapper.try_get_cell_map(1).unwrap();
        assert_eq!(cell_map.kind(), CellMapKind::Action);
        assert!(cell_map.ignore_errors());
        assert_eq!(mapper.columns(), vec![1]);

        let mut record = Primitive::default();
        cell_map.set_value(&mut record, &Value::Int(5)).unwrap();
        assert_eq!(record.string_value, "5");
        assert_eq!(record.int_value, None);
    }

    #[test]
    fn error_observer_and_factory() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut mapper = RowMapper::with_factory(|| Primitive {
            int_value: Some(-1),
            string_value: "fresh".to_owned(),
        });
        let sink = Rc::clone(&seen);
        mapper.on_error(move |error| sink.borrow_mut().push(error.cell.clone()));

        let instance = mapper.create_instance();
        assert_eq!(instance.int_value, Some(-1));
        assert_eq!(instance.string_value, "fresh");

        let error = ConversionError {
            cell: CellAddress::new("Primitives", 4, 0),
            message: "bad".to_owned(),
            raw_value: Value::from("x"),
        };
        mapper.report(&error);
        assert_eq!(*seen.borrow(), vec![CellAddress::new("primitives", 4, 0)]);

        mapper.instance_factory(Primitive::default);
        assert_eq!(mapper.create_instance().int_value, None);
    }

    #[test]
    fn null_literals_become_empty() {
        let mut mapper = RowMapper::<Primitive>::new();
        let na = Value::from("N/A");
        let text = Value::from("n/a");
        assert_eq!(mapper.normalize(&na), &na);

        mapper.nulls(["N/A", "-"]);
        assert_eq!(mapper.normalize(&na), &Value::Empty);
        assert_eq!(mapper.normalize(&text), &text);
        assert_eq!(mapper.normalize(&Value::Int(1)), &Value::Int(1));
    }
}
