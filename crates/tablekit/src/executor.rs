//! Statement execution.
//!
//! [`Executor`] is the only thing a [`TableHelper`](crate::TableHelper) needs
//! from the database layer: run a parameterized statement and report affected
//! rows, or run a parameterized query and hand back raw rows. SQL arrives with
//! ANSI `?` placeholders and values in placeholder order.
//!
//! [`PgExecutor`] adapts any [`GenericClient`] (tokio-postgres client,
//! transaction, or pooled connection) to that contract.

use bytes::BytesMut;
use crate::client::GenericClient;
use crate::error::{OrmError, OrmResult};
use crate::row::RawRow;
use crate::value::Value;
use chrono::{DateTime, NaiveDateTime, Utc};
use std::error::Error;
use std::sync::Arc;
use tokio_postgres::Row;
use tokio_postgres::types::{IsNull, ToSql, Type};

/// Runs SQL on behalf of a table helper.
pub trait Executor: Send + Sync {
    /// Execute a mutating statement and return the number of affected rows.
    fn execute(
        &self,
        sql: &str,
        params: &[Value],
    ) -> impl std::future::Future<Output = OrmResult<u64>> + Send;

    /// Execute a query and return its rows in result order.
    fn query(
        &self,
        sql: &str,
        params: &[Value],
    ) -> impl std::future::Future<Output = OrmResult<Vec<RawRow>>> + Send;
}

impl<X: Executor> Executor for &X {
    async fn execute(&self, sql: &str, params: &[Value]) -> OrmResult<u64> {
        (**self).execute(sql, params).await
    }

    async fn query(&self, sql: &str, params: &[Value]) -> OrmResult<Vec<RawRow>> {
        (**self).query(sql, params).await
    }
}

impl<X: Executor> Executor for Arc<X> {
    async fn execute(&self, sql: &str, params: &[Value]) -> OrmResult<u64> {
        (**self).execute(sql, params).await
    }

    async fn query(&self, sql: &str, params: &[Value]) -> OrmResult<Vec<RawRow>> {
        (**self).query(sql, params).await
    }
}

/// [`Executor`] over a Postgres [`GenericClient`].
#[derive(Debug, Clone)]
pub struct PgExecutor<C> {
    client: C,
    /// Truncate logged SQL (in bytes). `None` means no truncation.
    max_sql_length: Option<usize>,
}

impl<C: GenericClient> PgExecutor<C> {
    pub fn new(client: C) -> Self {
        Self {
            client,
            max_sql_length: Some(200),
        }
    }

    /// Set maximum SQL length to log.
    pub fn max_sql_length(mut self, len: usize) -> Self {
        self.max_sql_length = Some(len);
        self
    }

    /// Disable SQL truncation in logs.
    pub fn no_truncate(mut self) -> Self {
        self.max_sql_length = None;
        self
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn into_inner(self) -> C {
        self.client
    }

    fn prepare(&self, sql: &str, param_count: usize) -> String {
        let sql = numbered_placeholders(sql);
        let logged = match self.max_sql_length {
            Some(max) if sql.len() > max => format!("{}...", truncate_sql_bytes(&sql, max)),
            _ => sql.clone(),
        };
        tracing::trace!(target: "tablekit.pg", param_count, sql = %logged);
        sql
    }
}

fn param_refs(params: &[Value]) -> Vec<&(dyn ToSql + Sync)> {
    params.iter().map(|v| v as &(dyn ToSql + Sync)).collect()
}

impl<C: GenericClient> Executor for PgExecutor<C> {
    async fn execute(&self, sql: &str, params: &[Value]) -> OrmResult<u64> {
        let sql = self.prepare(sql, params.len());
        self.client.execute(&sql, &param_refs(params)).await
    }

    async fn query(&self, sql: &str, params: &[Value]) -> OrmResult<Vec<RawRow>> {
        let sql = self.prepare(sql, params.len());
        let rows = self.client.query(&sql, &param_refs(params)).await?;
        rows.iter().map(decode_row).collect()
    }
}

/// Rewrite ANSI `?` placeholders to Postgres `$1, $2, ...`.
///
/// `?` is left alone inside single-quoted literals, double-quoted
/// identifiers, `--` and `/* */` comments, and `$tag$ ... $tag$` bodies.
/// A doubled `??` is emitted as one literal `?`, so the jsonb operators are
/// written `??`, `??|` and `??&`.
pub fn numbered_placeholders(sql: &str) -> String {
    let chars: Vec<char> = sql.chars().collect();
    let mut out = String::with_capacity(sql.len() + 8);
    let mut count = 0usize;
    let mut i = 0;
    while i < chars.len() {
        let ch = chars[i];
        let next = chars.get(i + 1).copied();
        match ch {
            '\'' | '"' => {
                let end = find_char(&chars, i + 1, ch).map_or(chars.len(), |e| e + 1);
                out.extend(&chars[i..end]);
                i = end;
            }
            '-' if next == Some('-') => {
                let end = find_char(&chars, i, '\n').map_or(chars.len(), |e| e + 1);
                out.extend(&chars[i..end]);
                i = end;
            }
            '/' if next == Some('*') => {
                let end = find_seq(&chars, i + 2, &['*', '/']).map_or(chars.len(), |e| e + 2);
                out.extend(&chars[i..end]);
                i = end;
            }
            '$' => match dollar_tag(&chars, i) {
                Some(tag) => {
                    let body = i + tag.len();
                    let end = find_seq(&chars, body, &tag).map_or(chars.len(), |e| e + tag.len());
                    out.extend(&chars[i..end]);
                    i = end;
                }
                None => {
                    out.push(ch);
                    i += 1;
                }
            },
            '?' if next == Some('?') => {
                out.push('?');
                i += 2;
            }
            '?' => {
                count += 1;
                out.push('$');
                out.push_str(&count.to_string());
                i += 1;
            }
            _ => {
                out.push(ch);
                i += 1;
            }
        }
    }
    out
}

fn find_char(chars: &[char], from: usize, target: char) -> Option<usize> {
    chars[from.min(chars.len())..]
        .iter()
        .position(|&c| c == target)
        .map(|p| p + from)
}

fn find_seq(chars: &[char], from: usize, seq: &[char]) -> Option<usize> {
    let from = from.min(chars.len());
    chars[from..]
        .windows(seq.len())
        .position(|w| w == seq)
        .map(|p| p + from)
}

/// The opening `$tag$` (tag possibly empty) starting at `start`, if any.
/// `$1` style positional parameters and `$` inside identifiers are not tags.
fn dollar_tag(chars: &[char], start: usize) -> Option<Vec<char>> {
    if start > 0 && (chars[start - 1].is_alphanumeric() || chars[start - 1] == '_') {
        return None;
    }
    let mut end = start + 1;
    while let Some(&c) = chars.get(end) {
        if c == '$' {
            return Some(chars[start..=end].to_vec());
        }
        let valid = if end == start + 1 {
            c.is_alphabetic() || c == '_'
        } else {
            c.is_alphanumeric() || c == '_'
        };
        if !valid {
            return None;
        }
        end += 1;
    }
    None
}

fn truncate_sql_bytes(sql: &str, max: usize) -> &str {
    let mut end = max.min(sql.len());
    while !sql.is_char_boundary(end) {
        end -= 1;
    }
    &sql[..end]
}

fn int_to_sql(
    v: i64,
    ty: &Type,
    out: &mut BytesMut,
) -> Result<IsNull, Box<dyn Error + Sync + Send>> {
    if *ty == Type::INT2 {
        i16::try_from(v)?.to_sql(ty, out)
    } else if *ty == Type::INT4 {
        i32::try_from(v)?.to_sql(ty, out)
    } else {
        v.to_sql(ty, out)
    }
}

impl ToSql for Value {
    fn to_sql(
        &self,
        ty: &Type,
        out: &mut BytesMut,
    ) -> Result<IsNull, Box<dyn Error + Sync + Send>> {
        match self {
            Value::Null => Ok(IsNull::Yes),
            Value::Bool(v) => v.to_sql(ty, out),
            Value::SmallInt(v) => int_to_sql(i64::from(*v), ty, out),
            Value::Int(v) => int_to_sql(i64::from(*v), ty, out),
            Value::BigInt(v) => int_to_sql(*v, ty, out),
            Value::Double(v) if *ty == Type::FLOAT4 => (*v as f32).to_sql(ty, out),
            Value::Double(v) => v.to_sql(ty, out),
            Value::Text(v) => v.to_sql(ty, out),
            Value::Bytes(v) => v.to_sql(ty, out),
            Value::Uuid(v) => v.to_sql(ty, out),
            Value::Timestamp(v) if *ty == Type::TIMESTAMP => v.naive_utc().to_sql(ty, out),
            Value::Timestamp(v) => v.to_sql(ty, out),
            Value::Json(v) => v.to_sql(ty, out),
        }
    }

    fn accepts(_ty: &Type) -> bool {
        true
    }

    tokio_postgres::types::to_sql_checked!();
}

fn decode_row(row: &Row) -> OrmResult<RawRow> {
    (0..row.len()).map(|idx| decode_cell(row, idx)).collect()
}

fn decode_cell(row: &Row, idx: usize) -> OrmResult<Value> {
    let column = &row.columns()[idx];
    let ty = column.type_();
    let cell: Result<Option<Value>, tokio_postgres::Error> = if *ty == Type::BOOL {
        row.try_get::<_, Option<bool>>(idx).map(|v| v.map(Value::Bool))
    } else if *ty == Type::INT2 {
        row.try_get::<_, Option<i16>>(idx).map(|v| v.map(Value::SmallInt))
    } else if *ty == Type::INT4 {
        row.try_get::<_, Option<i32>>(idx).map(|v| v.map(Value::Int))
    } else if *ty == Type::INT8 {
        row.try_get::<_, Option<i64>>(idx).map(|v| v.map(Value::BigInt))
    } else if *ty == Type::FLOAT4 {
        row.try_get::<_, Option<f32>>(idx)
            .map(|v| v.map(|f| Value::Double(f64::from(f))))
    } else if *ty == Type::FLOAT8 {
        row.try_get::<_, Option<f64>>(idx).map(|v| v.map(Value::Double))
    } else if *ty == Type::TEXT || *ty == Type::VARCHAR || *ty == Type::BPCHAR || *ty == Type::NAME
    {
        row.try_get::<_, Option<String>>(idx).map(|v| v.map(Value::Text))
    } else if *ty == Type::BYTEA {
        row.try_get::<_, Option<Vec<u8>>>(idx).map(|v| v.map(Value::Bytes))
    } else if *ty == Type::UUID {
        row.try_get::<_, Option<uuid::Uuid>>(idx).map(|v| v.map(Value::Uuid))
    } else if *ty == Type::TIMESTAMPTZ {
        row.try_get::<_, Option<DateTime<Utc>>>(idx)
            .map(|v| v.map(Value::Timestamp))
    } else if *ty == Type::TIMESTAMP {
        row.try_get::<_, Option<NaiveDateTime>>(idx)
            .map(|v| v.map(|ts| Value::Timestamp(ts.and_utc())))
    } else if *ty == Type::JSON || *ty == Type::JSONB {
        row.try_get::<_, Option<serde_json::Value>>(idx)
            .map(|v| v.map(Value::Json))
    } else {
        return Err(OrmError::decode(
            column.name(),
            format!("unsupported column type '{}'", ty.name()),
        ));
    };
    cell.map(|v| v.unwrap_or(Value::Null))
        .map_err(|e| OrmError::decode(column.name(), e.to_string()))
}
