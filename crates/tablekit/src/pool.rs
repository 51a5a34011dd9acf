//! Connection pool utilities

use crate::error::{OrmError, OrmResult};
use deadpool_postgres::{Manager, ManagerConfig, Pool, RecyclingMethod};
use serde::Deserialize;
use tokio_postgres::NoTls;

/// Pool settings, typically deserialized from application configuration.
///
/// ```
/// let config: tablekit::PoolConfig =
///     serde_json::from_str(r#"{ "database_url": "postgres://localhost/app" }"#).unwrap();
/// assert_eq!(config.max_size, 16);
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct PoolConfig {
    pub database_url: String,
    #[serde(default = "default_max_size")]
    pub max_size: usize,
}

fn default_max_size() -> usize {
    16
}

impl PoolConfig {
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            max_size: default_max_size(),
        }
    }

    pub fn max_size(mut self, max_size: usize) -> Self {
        self.max_size = max_size;
        self
    }
}

/// Create a `NoTls` connection pool from a database URL with default settings.
pub fn create_pool_from_url(database_url: &str) -> OrmResult<Pool> {
    create_pool(&PoolConfig::new(database_url))
}

/// Create a `NoTls` connection pool.
///
/// Pooled connections implement [`GenericClient`](crate::GenericClient), so
/// they can be wrapped in a [`PgExecutor`](crate::PgExecutor).
pub fn create_pool(config: &PoolConfig) -> OrmResult<Pool> {
    let pg_config: tokio_postgres::Config = config
        .database_url
        .parse()
        .map_err(|e: tokio_postgres::Error| OrmError::Connection(e.to_string()))?;

    let manager_config = ManagerConfig {
        recycling_method: RecyclingMethod::Fast,
    };
    let mgr = Manager::from_config(pg_config, NoTls, manager_config);
    Pool::builder(mgr)
        .max_size(config.max_size)
        .build()
        .map_err(|e| OrmError::Pool(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_url_is_connection_error() {
        let err = create_pool_from_url("host=localhost port=notaport").unwrap_err();
        assert!(matches!(err, OrmError::Connection(_)));
    }

    #[test]
    fn max_size_defaults_and_overrides() {
        let config = PoolConfig::new("postgres://localhost/app");
        assert_eq!(config.max_size, 16);
        assert_eq!(config.max_size(4).max_size, 4);
    }
}
