use super::TableHelper;
use crate::column::{ColumnBinding, ColumnMapping, InsertPolicy};
use crate::error::{OrmError, OrmResult};
use crate::executor::Executor;
use crate::row::RawRow;
use crate::value::{NoId, SqlValue};
use std::fmt;
use std::sync::Arc;

pub(super) type Factory<E> = Box<dyn Fn() -> E + Send + Sync>;

/// Assembles and validates a [`TableHelper`].
///
/// Special columns are checked as they are registered: a second id or version
/// column fails immediately. Everything else is checked by [`Builder::build`].
///
/// # Example
///
/// ```
/// use tablekit::{Builder, OrmResult};
///
/// #[derive(Debug, Default)]
/// struct Post {
///     id: Option<i64>,
///     version: i32,
///     title: String,
/// }
///
/// # fn main() -> OrmResult<()> {
/// let builder = Builder::<Post, i64>::new("Post", "posts", Post::default)
///     .auto_insert_id("id", |p: &Post| p.id.unwrap_or_default(), |p, v| p.id = Some(v))?
///     .non_auto_inserted_version("version", |p: &Post| p.version, |p, v| p.version = v)?
///     .column("title", |p: &Post| p.title.clone(), |p, v| p.title = v)?;
/// # let _ = builder;
/// # Ok(())
/// # }
/// ```
pub struct Builder<E, I> {
    name: String,
    table_name: String,
    id_requested: bool,
    factory: Factory<E>,
    columns: Vec<Arc<dyn ColumnMapping<E>>>,
    id: Option<Arc<ColumnBinding<E, I>>>,
    version: Option<Arc<dyn ColumnMapping<E>>>,
    too_many_suffix_text: String,
}

impl<E: 'static, I: SqlValue> Builder<E, I> {
    /// Start a builder for a table whose identifier column holds an `I`.
    pub fn new(
        name: impl Into<String>,
        table_name: impl Into<String>,
        factory: impl Fn() -> E + Send + Sync + 'static,
    ) -> Self {
        Self::with_id_requested(name, table_name, factory, true)
    }

    fn with_id_requested(
        name: impl Into<String>,
        table_name: impl Into<String>,
        factory: impl Fn() -> E + Send + Sync + 'static,
        id_requested: bool,
    ) -> Self {
        Self {
            name: name.into(),
            table_name: table_name.into(),
            id_requested,
            factory: Box::new(factory),
            columns: Vec::new(),
            id: None,
            version: None,
            too_many_suffix_text: String::new(),
        }
    }

    /// Register a regular column. Columns are selected in registration order.
    pub fn add<V: SqlValue>(mut self, binding: ColumnBinding<E, V>) -> Self {
        self.columns.push(Arc::new(binding));
        self
    }

    pub fn column<V: SqlValue>(
        self,
        name: &str,
        getter: impl Fn(&E) -> V + Send + Sync + 'static,
        setter: impl Fn(&mut E, V) + Send + Sync + 'static,
    ) -> OrmResult<Self> {
        Ok(self.add(ColumnBinding::new(name, getter, setter)?))
    }

    pub fn column_with_policy<V: SqlValue>(
        self,
        name: &str,
        policy: InsertPolicy,
        getter: impl Fn(&E) -> V + Send + Sync + 'static,
        setter: impl Fn(&mut E, V) + Send + Sync + 'static,
    ) -> OrmResult<Self> {
        Ok(self.add(ColumnBinding::new(name, getter, setter)?.insert_policy(policy)))
    }

    /// Register a column read from the row by a custom reader, e.g. to
    /// normalize or parse a stored representation.
    pub fn column_with_reader<V: SqlValue>(
        self,
        name: &str,
        reader: impl Fn(&RawRow, usize) -> OrmResult<V> + Send + Sync + 'static,
        getter: impl Fn(&E) -> V + Send + Sync + 'static,
        setter: impl Fn(&mut E, V) + Send + Sync + 'static,
    ) -> OrmResult<Self> {
        Ok(self.add(ColumnBinding::with_reader(name, reader, getter, setter)?))
    }

    /// Register the identifier column.
    pub fn id(mut self, binding: ColumnBinding<E, I>) -> OrmResult<Self> {
        if let Some(existing) = &self.id {
            return Err(second_special("ID", existing.column_name(), binding.column_name()));
        }
        self.id = Some(Arc::new(binding));
        Ok(self)
    }

    /// Identifier generated by the database; never part of INSERT.
    pub fn auto_insert_id(
        self,
        name: &str,
        getter: impl Fn(&E) -> I + Send + Sync + 'static,
        setter: impl Fn(&mut E, I) + Send + Sync + 'static,
    ) -> OrmResult<Self> {
        let binding = ColumnBinding::new(name, getter, setter)?.insert_policy(InsertPolicy::Never);
        self.id(binding)
    }

    /// Identifier supplied by the application on insert.
    pub fn non_auto_inserted_id(
        self,
        name: &str,
        getter: impl Fn(&E) -> I + Send + Sync + 'static,
        setter: impl Fn(&mut E, I) + Send + Sync + 'static,
    ) -> OrmResult<Self> {
        self.id(ColumnBinding::new(name, getter, setter)?)
    }

    /// Register the optimistic-lock version column.
    ///
    /// Its value must be an integer at update time.
    pub fn version<V: SqlValue>(mut self, binding: ColumnBinding<E, V>) -> OrmResult<Self> {
        if let Some(existing) = &self.version {
            return Err(second_special(
                "version",
                existing.column_name(),
                binding.column_name(),
            ));
        }
        self.version = Some(Arc::new(binding));
        Ok(self)
    }

    /// Version column filled in by the database (e.g. a column default).
    pub fn auto_insert_version<V: SqlValue>(
        self,
        name: &str,
        getter: impl Fn(&E) -> V + Send + Sync + 'static,
        setter: impl Fn(&mut E, V) + Send + Sync + 'static,
    ) -> OrmResult<Self> {
        let binding = ColumnBinding::new(name, getter, setter)?.insert_policy(InsertPolicy::Never);
        self.version(binding)
    }

    pub fn non_auto_inserted_version<V: SqlValue>(
        self,
        name: &str,
        getter: impl Fn(&E) -> V + Send + Sync + 'static,
        setter: impl Fn(&mut E, V) + Send + Sync + 'static,
    ) -> OrmResult<Self> {
        self.version(ColumnBinding::new(name, getter, setter)?)
    }

    /// Extra text appended to "too many rows" errors from `query1`.
    pub fn too_many_suffix_text(mut self, text: impl Into<String>) -> Self {
        self.too_many_suffix_text = text.into().trim().to_string();
        self
    }

    /// Validate the registrations and freeze them into a [`TableHelper`].
    pub fn build<X: Executor>(self, executor: X) -> OrmResult<TableHelper<E, I, X>> {
        if self.name.trim().is_empty() {
            return Err(OrmError::invalid_argument("table helper name must not be blank"));
        }
        if self.table_name.trim().is_empty() {
            return Err(OrmError::invalid_argument(format!(
                "table name for {} must not be blank",
                self.name
            )));
        }
        if self.columns.is_empty() {
            return Err(OrmError::invalid_state(format!(
                "no regular columns registered for {}",
                self.name
            )));
        }
        match (self.id_requested, &self.id) {
            (true, None) => {
                return Err(OrmError::invalid_state(format!(
                    "id type ({}) indicated for {}, but no id column registered",
                    std::any::type_name::<I>(),
                    self.name
                )));
            }
            (false, Some(id)) => {
                return Err(OrmError::invalid_state(format!(
                    "id column '{}' registered for {}, but no id type was requested",
                    id.column_name(),
                    self.name
                )));
            }
            _ => {}
        }

        Ok(TableHelper::assemble(
            self.name,
            self.table_name,
            self.factory,
            self.columns,
            self.id,
            self.version,
            self.too_many_suffix_text,
            executor,
        ))
    }
}

impl<E: 'static> Builder<E, NoId> {
    /// Start a builder for a table without an identifier column.
    ///
    /// The id-based operations of the resulting helper fail with
    /// [`OrmError::InvalidState`].
    pub fn keyless(
        name: impl Into<String>,
        table_name: impl Into<String>,
        factory: impl Fn() -> E + Send + Sync + 'static,
    ) -> Self {
        Self::with_id_requested(name, table_name, factory, false)
    }
}

impl<E, I> fmt::Debug for Builder<E, I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Builder")
            .field("name", &self.name)
            .field("table_name", &self.table_name)
            .field("id_requested", &self.id_requested)
            .field("columns", &self.columns.len())
            .finish_non_exhaustive()
    }
}

fn second_special(what: &str, first: &str, second: &str) -> OrmError {
    OrmError::invalid_state(format!(
        "attempt to add 2nd {what} column, first '{first}', second '{second}'"
    ))
}
