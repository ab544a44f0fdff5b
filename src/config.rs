//! Configuration for PostgreSQL repositories
//!
//! Provides a builder pattern for configuring connections and table resolution.

use std::time::Duration;

use crate::error::{CriteriaError, Result};
use crate::sql::sanitize::validate_identifier;

/// Configuration for [`PgRepository`](crate::repository::PgRepository)
#[derive(Debug, Clone)]
pub struct RepositoryConfig {
    /// PostgreSQL database URL
    pub database_url: String,
    /// Schema qualifying every table (default: unqualified, resolved by `search_path`)
    pub schema: Option<String>,
    /// Maximum pool connections (default: 5)
    pub max_connections: u32,
    /// How long to wait for a pooled connection (default: 30s)
    pub acquire_timeout: Duration,
}

impl RepositoryConfig {
    /// Create a new configuration builder
    pub fn builder(database_url: impl Into<String>) -> RepositoryConfigBuilder {
        RepositoryConfigBuilder::new(database_url)
    }

    /// Check the values that end up in generated SQL
    pub fn validate(&self) -> Result<()> {
        if let Some(schema) = &self.schema {
            validate_identifier(schema).map_err(CriteriaError::validation)?;
        }
        if self.max_connections == 0 {
            return Err(CriteriaError::validation(
                "max_connections must be at least 1",
            ));
        }
        Ok(())
    }
}

/// Builder for RepositoryConfig
#[derive(Debug)]
pub struct RepositoryConfigBuilder {
    database_url: String,
    schema: Option<String>,
    max_connections: u32,
    acquire_timeout: Duration,
}

impl RepositoryConfigBuilder {
    /// Create a new builder with the database URL
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            schema: None,
            max_connections: 5,
            acquire_timeout: Duration::from_secs(30),
        }
    }

    /// Qualify tables with a schema
    pub fn schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    /// Set the maximum number of pooled connections (default: 5)
    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    /// Set the pool acquire timeout (default: 30s)
    pub fn acquire_timeout(mut self, timeout: Duration) -> Self {
        self.acquire_timeout = timeout;
        self
    }

    /// Build the configuration
    pub fn build(self) -> RepositoryConfig {
        RepositoryConfig {
            database_url: self.database_url,
            schema: self.schema,
            max_connections: self.max_connections,
            acquire_timeout: self.acquire_timeout,
        }
    }
}
