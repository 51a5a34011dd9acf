//! Per-table CRUD helper.
//!
//! A [`TableHelper`] owns the column bindings of one entity type and turns
//! them into SQL: a cached `SELECT <cols> FROM <table>`, INSERTs driven by
//! each column's [`InsertPolicy`](crate::InsertPolicy), UPDATEs guarded by an
//! optional optimistic-lock version column, and filtered reads built from
//! [`WhereClause`]s. Statements are handed to an [`Executor`].
//!
//! Column order is fixed at construction: identifier first, then version,
//! then regular columns in registration order. Row cells are read by that
//! order, so every SELECT issued here uses the same column list.

mod builder;

pub use builder::Builder;

use crate::clause::WhereClause;
use crate::column::{ColumnBinding, ColumnMapping, InsertPolicy};
use crate::error::{OrmError, OrmResult};
use crate::executor::Executor;
use crate::row::RawRow;
use crate::value::{SqlValue, Value};
use builder::Factory;
use std::fmt;
use std::sync::Arc;

/// Immutable CRUD helper for one entity/table pair.
///
/// Safe to share between tasks; all operations take `&self`.
pub struct TableHelper<E, I, X> {
    name: String,
    table_name: String,
    entity_name: &'static str,
    factory: Factory<E>,
    columns: Vec<Arc<dyn ColumnMapping<E>>>,
    insert_columns: Vec<Arc<dyn ColumnMapping<E>>>,
    id: Option<Arc<ColumnBinding<E, I>>>,
    /// Position of the version column in `columns`.
    version_index: Option<usize>,
    select_all: String,
    too_many_suffix_text: String,
    executor: X,
}

impl<E: 'static, I: SqlValue, X> TableHelper<E, I, X> {
    #[allow(clippy::too_many_arguments)]
    fn assemble(
        name: String,
        table_name: String,
        factory: Factory<E>,
        regular: Vec<Arc<dyn ColumnMapping<E>>>,
        id: Option<Arc<ColumnBinding<E, I>>>,
        version: Option<Arc<dyn ColumnMapping<E>>>,
        too_many_suffix_text: String,
        executor: X,
    ) -> Self {
        let mut columns: Vec<Arc<dyn ColumnMapping<E>>> = Vec::with_capacity(regular.len() + 2);
        if let Some(id) = &id {
            columns.push(id.clone());
        }
        let version_index = version.map(|version| {
            columns.push(version);
            columns.len() - 1
        });
        columns.extend(regular);

        let insert_columns = columns
            .iter()
            .filter(|c| c.policy() != InsertPolicy::Never)
            .cloned()
            .collect();
        let select_all = select_all_sql(&columns, &table_name);
        let entity_name = std::any::type_name::<E>()
            .rsplit("::")
            .next()
            .unwrap_or("entity");

        Self {
            name,
            table_name,
            entity_name,
            factory,
            columns,
            insert_columns,
            id,
            version_index,
            select_all,
            too_many_suffix_text,
            executor,
        }
    }
}

fn select_all_sql<E>(columns: &[Arc<dyn ColumnMapping<E>>], table_name: &str) -> String {
    let names: Vec<&str> = columns.iter().map(|c| c.column_name()).collect();
    format!("SELECT {} FROM {}", names.join(", "), table_name)
}

impl<E, I, X> TableHelper<E, I, X>
where
    E: fmt::Debug + 'static,
    I: SqlValue,
    X: Executor,
{
    /// Display name used in diagnostics.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    /// The cached `SELECT <cols> FROM <table>` text.
    pub fn select_all_sql(&self) -> &str {
        &self.select_all
    }

    /// Column names in SELECT order.
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.column_name()).collect()
    }

    pub fn id_column_name(&self) -> Option<&str> {
        self.id.as_ref().map(|id| id.column_name())
    }

    pub fn version_column_name(&self) -> Option<&str> {
        self.version_index.map(|idx| self.columns[idx].column_name())
    }

    pub fn executor(&self) -> &X {
        &self.executor
    }

    /// Build a fresh entity from a row whose cells follow SELECT order.
    pub fn map_row(&self, row: &RawRow) -> OrmResult<E> {
        let mut target = (self.factory)();
        for (idx, column) in self.columns.iter().enumerate() {
            // SQL ordinals are 1-based
            column.read_into(&mut target, row, idx + 1)?;
        }
        Ok(target)
    }

    /// INSERT the entity.
    ///
    /// Columns whose policy is [`InsertPolicy::SkipIfNull`] are left out when
    /// their value is NULL, so column defaults apply.
    pub async fn insert(&self, entity: &E) -> OrmResult<()> {
        let mut names = Vec::with_capacity(self.insert_columns.len());
        let mut values = Vec::with_capacity(self.insert_columns.len());
        for column in &self.insert_columns {
            let value = column.value_of(entity);
            if !value.is_null() || column.policy() == InsertPolicy::Always {
                names.push(column.column_name());
                values.push(value);
            }
        }
        if values.is_empty() {
            return Err(OrmError::invalid_state(format!(
                "Insert Error -- All columns skipped for {}: {:?}",
                self.name, entity
            )));
        }

        let placeholders = vec!["?"; values.len()].join(", ");
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            self.table_name,
            names.join(", "),
            placeholders
        );
        let affected = self.execute("insert", &sql, &values).await?;
        if affected == 0 {
            return Err(OrmError::too_few_rows_affected(
                1,
                0,
                format!("Insert Failed for {}: {:?}", self.name, entity),
            ));
        }
        Ok(())
    }

    /// UPDATE every non-id column of the entity, matched by id (and version).
    ///
    /// With a version column the statement binds `version + 1` in SET and the
    /// entity's current version in WHERE. Returns `false` when no row
    /// matched, which is how a stale version (or a deleted row) shows up.
    /// The entity itself is not modified.
    pub async fn update_by_id(&self, entity: &E) -> OrmResult<bool> {
        let id_value = self.entity_id("update_by_id", entity)?;
        let id_column = self.required_id("update_by_id")?.column_name();

        let version = match self.version_index {
            Some(idx) => {
                let column = &self.columns[idx];
                let current = column.value_of(entity);
                let next = self.next_version(id_column, &id_value, column.column_name(), &current)?;
                Some((idx, column.column_name(), current, next))
            }
            None => None,
        };

        let mut assignments = Vec::with_capacity(self.columns.len());
        let mut values = Vec::with_capacity(self.columns.len() + 1);
        for (idx, column) in self.columns.iter().enumerate() {
            if self.id.is_some() && idx == 0 {
                continue;
            }
            let value = match &version {
                Some((version_idx, _, _, next)) if *version_idx == idx => next.clone(),
                _ => column.value_of(entity),
            };
            assignments.push(format!("{} = ?", column.column_name()));
            values.push(value);
        }

        let mut sql = format!(
            "UPDATE {} SET {} WHERE {} = ?",
            self.table_name,
            assignments.join(", "),
            id_column
        );
        values.push(id_value.clone());
        if let Some((_, version_column, current, _)) = version {
            sql.push_str(&format!(" AND {version_column} = ?"));
            values.push(current);
        }

        let affected = self.execute("update_by_id", &sql, &values).await?;
        if affected == 0 {
            tracing::debug!(
                target: "tablekit.sql",
                table = %self.table_name,
                id = %id_value,
                "update matched no row (missing or stale version)"
            );
        }
        Ok(affected > 0)
    }

    /// DELETE the row with this id. Returns whether a row was deleted.
    pub async fn delete_by_id(&self, id: I) -> OrmResult<bool> {
        let id_column = self.required_id("delete_by_id")?.column_name();
        let id_value = non_null_id(id_column, id)?;
        let sql = format!("DELETE FROM {} WHERE {} = ?", self.table_name, id_column);
        let affected = self.execute("delete_by_id", &sql, &[id_value]).await?;
        Ok(affected > 0)
    }

    /// Run an arbitrary mutating statement; returns affected rows.
    pub async fn apply_update(&self, sql: &str, args: &[Value]) -> OrmResult<u64> {
        self.execute("apply_update", sql, args).await
    }

    /// SELECT the row with this id, if any.
    pub async fn read_by_id(&self, id: I) -> OrmResult<Option<E>> {
        let id_column = self.required_id("read_by_id")?.column_name();
        let id_value = non_null_id(id_column, id)?;
        let mut clause = WhereClause::new();
        clause.add_value(format!("{id_column} = ?"), id_value);
        self.query1(&clause, None).await
    }

    /// Page through ids in ascending order.
    ///
    /// When `greater_than` is given and not NULL, `id > ?` is ANDed onto
    /// `filter` (which is parenthesized first). At most `limit` ids are
    /// returned.
    pub async fn get_ids(
        &self,
        greater_than: Option<I>,
        filter: Option<&WhereClause>,
        limit: usize,
    ) -> OrmResult<Vec<I>> {
        let id = self.required_id("get_ids")?;
        let id_column = id.column_name();
        if limit == 0 {
            return Err(OrmError::invalid_argument(format!(
                "get_ids ({}) limit must be positive",
                self.entity_name
            )));
        }

        let filter = WhereClause::de_null(filter);
        let greater_than = greater_than
            .map(SqlValue::into_value)
            .filter(|v| !v.is_null());
        let clause = match greater_than {
            None => filter.clone(),
            Some(bound) => {
                let predicate = format!("{id_column} > ?");
                let mut combined = WhereClause::new();
                if filter.is_empty() {
                    combined.add_value(predicate, bound);
                } else {
                    combined.add("(");
                    for token in filter.tokens() {
                        combined.add_token(token.clone());
                    }
                    combined.add(")").add("and").add_value(predicate, bound);
                }
                combined
            }
        };

        let sql = format!(
            "SELECT {} FROM {}{} ORDER BY {} ASC LIMIT {}",
            id_column,
            self.table_name,
            clause.text(),
            id_column,
            limit
        );
        let rows = self
            .fetch("get_ids", &sql, &clause.question_mark_values())
            .await?;
        rows.iter()
            .map(|row| {
                id.read(row, 1).map_err(|e| {
                    OrmError::data_access(format!("reading id column '{id_column}': {e}"))
                })
            })
            .collect()
    }

    /// SELECT the entities with the given ids, ordered by id.
    ///
    /// NULL ids are dropped; the IN-list is bound as parameters.
    pub async fn get_entities_by_ids(
        &self,
        ids: impl IntoIterator<Item = I>,
    ) -> OrmResult<Vec<E>> {
        let id_column = self.required_id("get_entities_by_ids")?.column_name();
        let mut clause = WhereClause::new();
        for value in ids.into_iter().map(SqlValue::into_value) {
            if value.is_null() {
                continue;
            }
            if clause.is_empty() {
                clause.add_unpadded_value(format!("{id_column} IN (?"), value);
            } else {
                clause.add_unpadded_value(",?", value);
            }
        }
        if clause.is_empty() {
            return Ok(Vec::new());
        }
        clause.add(")");

        let sql = format!(
            "{}{} ORDER BY {}",
            self.select_all,
            clause.text(),
            id_column
        );
        self.query_sql(&sql, &clause.question_mark_values()).await
    }

    /// SELECT at most one entity matching `filter`.
    ///
    /// `inserted` marks a read-back right after inserting that entity: then
    /// finding no row is an [`OrmError::IncorrectRowCount`], not `None`.
    pub async fn query1(&self, filter: &WhereClause, inserted: Option<&E>) -> OrmResult<Option<E>> {
        let sql = format!("{}{}", self.select_all, filter.text());
        self.query1_sql(&sql, inserted, &filter.question_mark_values())
            .await
    }

    /// [`TableHelper::query1`] over caller-written SQL.
    pub async fn query1_sql(
        &self,
        sql: &str,
        inserted: Option<&E>,
        args: &[Value],
    ) -> OrmResult<Option<E>> {
        let mut entities = self.fetch_entities("query1", sql, args).await?;
        match entities.len() {
            1 => Ok(entities.pop()),
            0 => match inserted {
                Some(entity) => {
                    let message = format!("No {} Record Stored for: {:?}", self.name, entity);
                    tracing::warn!(target: "tablekit.sql", table = %self.table_name, "{message}");
                    Err(OrmError::incorrect_row_count(1, 0, message))
                }
                None => Ok(None),
            },
            found => Err(self.too_many(found, args)),
        }
    }

    /// SELECT every entity matching `filter`.
    ///
    /// `order_by` is appended verbatim (e.g. `"ORDER BY name"`) unless blank.
    pub async fn query(
        &self,
        filter: Option<&WhereClause>,
        order_by: Option<&str>,
    ) -> OrmResult<Vec<E>> {
        let filter = WhereClause::de_null(filter);
        let mut sql = format!("{}{}", self.select_all, filter.text());
        if let Some(order_by) = order_by.map(str::trim).filter(|s| !s.is_empty()) {
            sql.push(' ');
            sql.push_str(order_by);
        }
        self.query_sql(&sql, &filter.question_mark_values()).await
    }

    /// SELECT with caller-written SQL whose columns follow SELECT order.
    pub async fn query_sql(&self, sql: &str, args: &[Value]) -> OrmResult<Vec<E>> {
        self.fetch_entities("query", sql, args).await
    }

    async fn fetch_entities(&self, op: &'static str, sql: &str, args: &[Value]) -> OrmResult<Vec<E>> {
        let rows = self.fetch(op, sql, args).await?;
        rows.iter().map(|row| self.map_row(row)).collect()
    }

    async fn fetch(&self, op: &'static str, sql: &str, args: &[Value]) -> OrmResult<Vec<RawRow>> {
        self.log_statement(op, sql, args.len());
        self.executor.query(sql, args).await
    }

    async fn execute(&self, op: &'static str, sql: &str, args: &[Value]) -> OrmResult<u64> {
        self.log_statement(op, sql, args.len());
        self.executor.execute(sql, args).await
    }

    fn log_statement(&self, op: &'static str, sql: &str, param_count: usize) {
        tracing::debug!(
            target: "tablekit.sql",
            table = %self.table_name,
            op,
            param_count,
            sql = %sql,
        );
    }

    fn required_id(&self, what: &str) -> OrmResult<&ColumnBinding<E, I>> {
        self.id.as_deref().ok_or_else(|| {
            OrmError::invalid_state(format!(
                "{} ({}) does NOT have an ID field!",
                what, self.entity_name
            ))
        })
    }

    fn entity_id(&self, what: &str, entity: &E) -> OrmResult<Value> {
        let id = self.required_id(what)?;
        let value = id.value_of(entity);
        if value.is_null() {
            return Err(OrmError::invalid_argument(format!(
                "ID field for {} ({}) was NULL, but is required: {:?}",
                what, self.entity_name, entity
            )));
        }
        Ok(value)
    }

    fn next_version(
        &self,
        id_column: &str,
        id_value: &Value,
        version_column: &str,
        current: &Value,
    ) -> OrmResult<Value> {
        let next = match *current {
            Value::SmallInt(v) => v.checked_add(1).map(Value::SmallInt),
            Value::Int(v) => v.checked_add(1).map(Value::Int),
            Value::BigInt(v) => v.checked_add(1).map(Value::BigInt),
            _ => {
                let found = if current.is_null() {
                    ": null".to_string()
                } else {
                    format!(" '{}' of: {}", current.type_name(), current)
                };
                return Err(OrmError::invalid_state(format!(
                    "Updated {} with {}={} was expected to have a {} field that is an integer value, but found{}",
                    self.entity_name, id_column, id_value, version_column, found
                )));
            }
        };
        next.ok_or_else(|| {
            OrmError::invalid_state(format!(
                "Updated {} with {}={} has {} {} which cannot be incremented",
                self.entity_name, id_column, id_value, version_column, current
            ))
        })
    }

    fn too_many(&self, found: usize, args: &[Value]) -> OrmError {
        let mut message = format!("{} {} Records found", found, self.name);
        if !self.too_many_suffix_text.is_empty() {
            message.push(' ');
            message.push_str(&self.too_many_suffix_text);
        }
        let mut prefix = ": ";
        for arg in args {
            message.push_str(prefix);
            message.push_str(&arg.to_string());
            prefix = ", ";
        }
        tracing::warn!(target: "tablekit.sql", table = %self.table_name, "{message}");
        OrmError::incorrect_row_count(1, found, message)
    }
}

fn non_null_id<I: SqlValue>(id_column: &str, id: I) -> OrmResult<Value> {
    let value = id.into_value();
    if value.is_null() {
        return Err(OrmError::invalid_argument(format!(
            "{id_column} was NULL, but is required"
        )));
    }
    Ok(value)
}

impl<E, I, X> fmt::Debug for TableHelper<E, I, X> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TableHelper")
            .field("name", &self.name)
            .field("table_name", &self.table_name)
            .field("select_all", &self.select_all)
            .finish_non_exhaustive()
    }
}
