use crate::mapper::convert::ConvertError;
use crate::mapper::convert::FromCell;
use crate::spreadsheet::Value;
use std::fmt::Debug;
use std::marker::PhantomData;

/// Writes one raw cell value into a target record.
type Apply<T> = Box<dyn Fn(&mut T, &Value) -> Result<(), ConvertError>>;

/// How a column binding turns a raw value into a field write.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CellMapKind {
    /// Converted to the field type, then written through a field accessor
    Typed,
    /// Handed raw to a caller-supplied action
    Action,
}

/// Binding of one column to a write operation on the target record.
pub struct CellMap<T> {
    column_index: usize,
    kind: CellMapKind,
    ignore_errors: bool,
    apply: Apply<T>,
}

impl<T: 'static> CellMap<T> {
    /// Typed binding writing `P::from_cell(value)` into the accessed field.
    pub(crate) fn typed<P, A>(column_index: usize, accessor: A) -> Self
    where
        P: FromCell + 'static,
        A: Fn(&mut T) -> &mut P + 'static,
    {
        CellMap {
            column_index,
            kind: CellMapKind::Typed,
            ignore_errors: true,
            apply: typed_apply(accessor, P::from_cell),
        }
    }

    /// Action binding handing the raw value to `action`.
    pub(crate) fn action<F>(column_index: usize, action: F) -> Self
    where
        F: Fn(&mut T, &Value) -> Result<(), ConvertError> + 'static,
    {
        CellMap {
            column_index,
            kind: CellMapKind::Action,
            ignore_errors: true,
            apply: Box::new(action),
        }
    }
}

impl<T> CellMap<T> {
    /// 0-based column index this binding reads.
    #[inline]
    pub fn column_index(&self) -> usize {
        self.column_index
    }

    /// Whether the binding is typed or an action.
    #[inline]
    pub fn kind(&self) -> CellMapKind {
        self.kind
    }

    /// Whether conversion errors of this column are suppressed (default true).
    #[inline]
    pub fn ignore_errors(&self) -> bool {
        self.ignore_errors
    }

    pub fn set_ignore_errors(&mut self, ignore: bool) {
        self.ignore_errors = ignore;
    }

    /// Applies a raw value to `target`.
    ///
    /// Errors from the converter, setter or action are returned as they are.
    #[inline]
    pub fn set_value(&self, target: &mut T, value: &Value) -> Result<(), ConvertError> {
        (self.apply)(target, value)
    }
}

impl<T> Debug for CellMap<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CellMap")
            .field("column_index", &self.column_index)
            .field("kind", &self.kind)
            .field("ignore_errors", &self.ignore_errors)
            .finish_non_exhaustive()
    }
}

fn typed_apply<T, P, A, C>(accessor: A, converter: C) -> Apply<T>
where
    T: 'static,
    P: 'static,
    A: Fn(&mut T) -> &mut P + 'static,
    C: Fn(&Value) -> Result<P, ConvertError> + 'static,
{
    Box::new(move |target: &mut T, value: &Value| {
        let converted = converter(value)?;
        *accessor(target) = converted;
        Ok(())
    })
}

/// Fluent handle over a freshly registered typed binding.
pub struct TypedCellMapper<'m, T, P, A> {
    cell_map: &'m mut CellMap<T>,
    accessor: A,
    field: PhantomData<fn() -> P>,
}

impl<'m, T, P, A> TypedCellMapper<'m, T, P, A>
where
    T: 'static,
    P: 'static,
    A: Fn(&mut T) -> &mut P + Clone + 'static,
{
    pub(crate) fn new(cell_map: &'m mut CellMap<T>, accessor: A) -> Self {
        TypedCellMapper {
            cell_map,
            accessor,
            field: PhantomData,
        }
    }

    /// Replaces the default conversion with `converter`.
    ///
    /// ```
    /// use rusty_mapper::mapper::RowMapper;
    ///
    /// #[derive(Default)]
    /// struct Record {
    ///     label: String,
    /// }
    ///
    /// let mut mapper = RowMapper::<Record>::new();
    /// mapper
    ///     .map_column("A", |record: &mut Record| &mut record.label)
    ///     .unwrap()
    ///     .converter(|raw| Ok(raw.to_string()));
    /// ```
    pub fn converter<C>(self, converter: C) -> Self
    where
        C: Fn(&Value) -> Result<P, ConvertError> + 'static,
    {
        self.cell_map.apply = typed_apply(self.accessor.clone(), converter);
        self
    }

    /// Sets whether conversion errors of this column are suppressed.
    pub fn ignore_errors(self, ignore: bool) -> Self {
        self.cell_map.ignore_errors = ignore;
        self
    }

    pub fn column_index(&self) -> usize {
        self.cell_map.column_index
    }
}

/// Fluent handle over a freshly registered action binding.
pub struct ActionCellMapper<'m, T> {
    cell_map: &'m mut CellMap<T>,
}

impl<'m, T> ActionCellMapper<'m, T> {
    pub(crate) fn new(cell_map: &'m mut CellMap<T>) -> Self {
        ActionCellMapper { cell_map }
    }

    /// Sets whether errors returned by the action are suppressed.
    pub fn ignore_errors(self, ignore: bool) -> Self {
        self.cell_map.ignore_errors = ignore;
        self
    }

    pub fn column_index(&self) -> usize {
        self.cell_map.column_index
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[derive(Debug, Default, PartialEq)]
    struct Record {
        count: Option<i32>,
        label: String,
        flag: Option<bool>,
    }

    #[test]
    fn typed_binding_converts_and_writes() {
        let cell_map = CellMap::typed(0, |record: &mut Record| &mut record.count);
        let mut record = Record::default();
        cell_map.set_value(&mut record, &Value::Float(2.0)).unwrap();
        assert_eq!(record.count, Some(2));
        cell_map.set_value(&mut record, &Value::Empty).unwrap();
        assert_eq!(record.count, None);
        assert_eq!(cell_map.kind(), CellMapKind::Typed);
        assert!(cell_map.ignore_errors());
    }

    #[test]
    fn failed_conversion_leaves_field_untouched() {
        let cell_map = CellMap::typed(3, |record: &mut Record| &mut record.count);
        let mut record = Record {
            count: Some(9),
            ..Record::default()
        };
        let error = cell_map
            .set_value(&mut record, &Value::from("totally_invalid"))
            .unwrap_err();
        assert_eq!(
            error,
            ConvertError::Format {
                value: "totally_invalid".to_owned(),
                target: "i32"
            }
        );
        assert_eq!(record.count, Some(9));
    }

    #[test]
    fn custom_converter_replaces_default() {
        let mut cell_map = CellMap::typed(0, |record: &mut Record| &mut record.label);
        TypedCellMapper::new(&mut cell_map, |record: &mut Record| &mut record.label)
            .converter(|raw| Ok(if raw.is_empty() { String::new() } else { raw.to_string() }))
            .ignore_errors(false);
        let mut record = Record::default();
        cell_map.set_value(&mut record, &Value::Int(1)).unwrap();
        assert_eq!(record.label, "1");
        cell_map.set_value(&mut record, &Value::Empty).unwrap();
        assert_eq!(record.label, "");
        assert!(!cell_map.ignore_errors());
    }

    #[test]
    fn action_binding_receives_raw_value() {
        let mut cell_map = CellMap::action(7, |record: &mut Record, raw: &Value| {
            match raw.to_string().to_lowercase().as_str() {
                "success" | "1" => record.flag = Some(true),
                "fault" | "0" => record.flag = Some(false),
                other => return Err(ConvertError::custom(format!("unknown state '{other}'"))),
            }
            Ok(())
        });
        ActionCellMapper::new(&mut cell_map).ignore_errors(false);

        let mut record = Record::default();
        cell_map.set_value(&mut record, &Value::from("Success")).unwrap();
        assert_eq!(record.flag, Some(true));
        cell_map.set_value(&mut record, &Value::Int(0)).unwrap();
        assert_eq!(record.flag, Some(false));
        assert_eq!(
            cell_map.set_value(&mut record, &Value::from("maybe")),
            Err(ConvertError::Custom("unknown state 'maybe'".to_owned()))
        );
        assert_eq!(cell_map.kind(), CellMapKind::Action);
        assert_eq!(cell_map.column_index(), 7);
        assert!(!cell_map.ignore_errors());
    }
}
