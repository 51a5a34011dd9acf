//! # tablekit
//!
//! Reflection-free table helpers for Postgres-style databases.
//!
//! ## Features
//!
//! - **Explicit column bindings**: each column is a typed getter/setter pair,
//!   checked at compile time; no reflection, no derive magic
//! - **CRUD SQL**: INSERT honouring per-column insert policies, UPDATE with an
//!   optional optimistic-lock version column, DELETE / SELECT by id
//! - **Parameter-safe filters**: [`WhereClause`] composes `WHERE` fragments and
//!   keeps bound values aligned with their `?` placeholders
//! - **Pluggable execution**: anything implementing [`Executor`] runs the
//!   statements; [`PgExecutor`] adapts tokio-postgres clients, transactions
//!   and pooled connections
//!
//! ## Example
//!
//! ```ignore
//! use tablekit::{Builder, InsertPolicy, PgExecutor, WhereClause};
//!
//! let posts = Builder::<Post, i64>::new("Post", "posts", Post::default)
//!     .auto_insert_id("id", |p: &Post| p.id, |p, v| p.id = v)?
//!     .auto_insert_version("version", |p: &Post| p.version, |p, v| p.version = v)?
//!     .column("title", |p: &Post| p.title.clone(), |p, v| p.title = v)?
//!     .column_with_policy("body", InsertPolicy::SkipIfNull, |p: &Post| p.body.clone(), |p, v| p.body = v)?
//!     .build(PgExecutor::new(client))?;
//!
//! posts.insert(&draft).await?;
//!
//! let mut filter = WhereClause::new();
//! filter.add_value("title = ?", draft.title.clone());
//! let stored = posts.query1(&filter, Some(&draft)).await?;
//!
//! if !posts.update_by_id(&edited).await? {
//!     // someone else updated the row first
//! }
//! ```

pub mod clause;
pub mod client;
pub mod column;
pub mod error;
pub mod executor;
pub mod row;
pub mod table;
pub mod value;

pub use clause::{Token, WhereClause};
pub use client::GenericClient;
pub use column::{ColumnBinding, ColumnMapping, InsertPolicy};
pub use error::{OrmError, OrmResult};
pub use executor::{Executor, PgExecutor, numbered_placeholders};
pub use row::RawRow;
pub use table::{Builder, TableHelper};
pub use value::{NoId, SqlValue, Value};

#[cfg(feature = "pool")]
pub mod pool;

#[cfg(feature = "pool")]
pub use pool::{PoolConfig, create_pool, create_pool_from_url};
