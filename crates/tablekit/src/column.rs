//! Column bindings: how one table column maps onto one entity field.

use crate::error::{OrmError, OrmResult};
use crate::row::RawRow;
use crate::value::{SqlValue, Value};
use std::fmt;

/// Whether (and when) a column takes part in INSERT statements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InsertPolicy {
    /// Always insert, binding NULL when the entity value is NULL.
    #[default]
    Always,
    /// Insert only when the entity value is non-NULL (lets a column default apply).
    SkipIfNull,
    /// Never insert (auto-generated columns such as serial ids).
    Never,
}

type Reader<V> = Box<dyn Fn(&RawRow, usize) -> OrmResult<V> + Send + Sync>;
type Setter<E, V> = Box<dyn Fn(&mut E, V) + Send + Sync>;
type Getter<E, V> = Box<dyn Fn(&E) -> V + Send + Sync>;

/// Typed binding between column `name` and a field of `E` holding a `V`.
pub struct ColumnBinding<E, V> {
    name: String,
    policy: InsertPolicy,
    reader: Reader<V>,
    setter: Setter<E, V>,
    getter: Getter<E, V>,
}

impl<E, V: SqlValue> ColumnBinding<E, V> {
    /// Bind a column read with [`RawRow::get`].
    ///
    /// Fails with [`OrmError::InvalidArgument`] for a blank column name.
    pub fn new(
        name: impl Into<String>,
        getter: impl Fn(&E) -> V + Send + Sync + 'static,
        setter: impl Fn(&mut E, V) + Send + Sync + 'static,
    ) -> OrmResult<Self> {
        Self::with_reader(name, |row: &RawRow, ordinal| row.get::<V>(ordinal), getter, setter)
    }

    /// Bind a column with a custom row reader.
    pub fn with_reader(
        name: impl Into<String>,
        reader: impl Fn(&RawRow, usize) -> OrmResult<V> + Send + Sync + 'static,
        getter: impl Fn(&E) -> V + Send + Sync + 'static,
        setter: impl Fn(&mut E, V) + Send + Sync + 'static,
    ) -> OrmResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(OrmError::invalid_argument("column name must not be blank"));
        }
        Ok(Self {
            name,
            policy: InsertPolicy::default(),
            reader: Box::new(reader),
            setter: Box::new(setter),
            getter: Box::new(getter),
        })
    }

    pub fn insert_policy(mut self, policy: InsertPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Read this column's typed value at `ordinal`.
    pub fn read(&self, row: &RawRow, ordinal: usize) -> OrmResult<V> {
        (self.reader)(row, ordinal)
    }

    pub fn get(&self, entity: &E) -> V {
        (self.getter)(entity)
    }

    pub fn set(&self, entity: &mut E, value: V) {
        (self.setter)(entity, value)
    }
}

impl<E, V> fmt::Debug for ColumnBinding<E, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ColumnBinding")
            .field("name", &self.name)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

/// Type-erased view of a [`ColumnBinding`], so one table can hold columns of
/// different value types in a single ordered list.
pub trait ColumnMapping<E>: Send + Sync {
    fn column_name(&self) -> &str;

    fn policy(&self) -> InsertPolicy;

    /// Read the cell at `ordinal` and store it into `target`.
    fn read_into(&self, target: &mut E, row: &RawRow, ordinal: usize) -> OrmResult<()>;

    /// The entity's current value for this column.
    fn value_of(&self, entity: &E) -> Value;
}

impl<E, V: SqlValue> ColumnMapping<E> for ColumnBinding<E, V> {
    fn column_name(&self) -> &str {
        &self.name
    }

    fn policy(&self) -> InsertPolicy {
        self.policy
    }

    fn read_into(&self, target: &mut E, row: &RawRow, ordinal: usize) -> OrmResult<()> {
        let value = self.read(row, ordinal).map_err(|e| {
            OrmError::data_access(format!(
                "reading column '{}' (#{}): {}",
                self.name, ordinal, e
            ))
        })?;
        self.set(target, value);
        Ok(())
    }

    fn value_of(&self, entity: &E) -> Value {
        self.get(entity).into_value()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Tag {
        label: Option<String>,
    }

    fn label() -> ColumnBinding<Tag, Option<String>> {
        ColumnBinding::new("label", |t: &Tag| t.label.clone(), |t, v| t.label = v).unwrap()
    }

    #[test]
    fn blank_name_is_rejected() {
        let err = ColumnBinding::new(" ", |t: &Tag| t.label.clone(), |t, v| t.label = v)
            .unwrap_err();
        assert!(err.is_invalid_argument());
    }

    #[test]
    fn reads_into_entity() {
        let binding = label();
        let mut tag = Tag::default();
        let row = RawRow::new(vec![Value::Text("red".into())]);
        binding.read_into(&mut tag, &row, 1).unwrap();
        assert_eq!(tag.label.as_deref(), Some("red"));
        assert_eq!(binding.value_of(&tag), Value::Text("red".into()));
    }

    #[test]
    fn read_failure_names_the_column() {
        let binding = label();
        let mut tag = Tag::default();
        let row = RawRow::new(vec![Value::Int(1)]);
        let err = binding.read_into(&mut tag, &row, 1).unwrap_err();
        assert!(err.is_data_access());
        assert!(err.to_string().contains("'label'"));
    }

    #[test]
    fn default_policy_is_always() {
        assert_eq!(label().policy(), InsertPolicy::Always);
        assert_eq!(
            label().insert_policy(InsertPolicy::Never).policy(),
            InsertPolicy::Never
        );
    }
}
