//! Repositories executing specifications
//!
//! [`SpecificationExecutor`] is the seam a composed [`Specification`] is
//! handed to. [`PgRepository`] renders it to SQL and runs it on PostgreSQL;
//! [`InMemoryRepository`](crate::memory::InMemoryRepository) evaluates it
//! against entities held in memory.

use std::marker::PhantomData;

use async_trait::async_trait;
use sqlx::postgres::{PgArguments, PgPoolOptions, PgRow};
use sqlx::query::QueryAs;
use sqlx::{FromRow, PgPool, Postgres};
use tracing::{debug, info, trace};

use crate::config::RepositoryConfig;
use crate::entity::Entity;
use crate::error::{CriteriaError, Result};
use crate::query::{PageRequest, QueryOptions};
use crate::specification::Specification;
use crate::sql::select::{SqlQuery, build_count, build_exists, build_select};
use crate::value::Value;

/// Executes specifications over a store of `T`
#[async_trait]
pub trait SpecificationExecutor<T: Entity>: Send + Sync {
    /// All entities matching `spec`, ordered and paged by `options`
    async fn find_all_with(
        &self,
        spec: &Specification<T>,
        options: &QueryOptions,
    ) -> Result<Vec<T>>;

    /// Number of entities matching `spec`
    async fn count(&self, spec: &Specification<T>) -> Result<i64>;

    async fn find_all(&self, spec: &Specification<T>) -> Result<Vec<T>> {
        self.find_all_with(spec, &QueryOptions::default()).await
    }

    /// The single entity matching `spec`
    ///
    /// Fails with [`CriteriaError::IncorrectResultSize`] when more than one
    /// entity matches.
    async fn find_one(&self, spec: &Specification<T>) -> Result<Option<T>> {
        // Two rows are enough to tell "one" from "many"
        let options = QueryOptions::new().with_page(PageRequest::new(0, 2));
        let mut found = self.find_all_with(spec, &options).await?;
        match found.len() {
            0 | 1 => Ok(found.pop()),
            actual => Err(CriteriaError::IncorrectResultSize {
                expected: 1,
                actual,
            }),
        }
    }

    async fn exists(&self, spec: &Specification<T>) -> Result<bool> {
        Ok(self.count(spec).await? > 0)
    }
}

/// PostgreSQL repository for entity `T`
///
/// Rows are decoded with [`FromRow`]. Only the root table is selected, so
/// relation collections on `T` should be `#[sqlx(skip)]`.
pub struct PgRepository<T> {
    /// Database connection pool
    pool: PgPool,
    /// Repository configuration
    config: RepositoryConfig,
    _entity: PhantomData<fn() -> T>,
}

impl<T> PgRepository<T>
where
    T: Entity + for<'r> FromRow<'r, PgRow> + Unpin,
{
    /// Connect a new pool from configuration
    pub async fn connect(config: RepositoryConfig) -> Result<Self> {
        config.validate()?;

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.acquire_timeout)
            .connect(&config.database_url)
            .await
            .map_err(|e| CriteriaError::connection(format!("Database connection failed: {}", e)))?;

        info!(
            table = T::TABLE,
            max_connections = config.max_connections,
            "Connected specification repository"
        );

        Ok(Self {
            pool,
            config,
            _entity: PhantomData,
        })
    }

    /// Create a repository over an existing pool
    ///
    /// Use this to share one pool between repositories of different entities.
    pub fn from_pool(pool: PgPool, config: RepositoryConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            pool,
            config,
            _entity: PhantomData,
        })
    }

    /// Get a reference to the connection pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub fn config(&self) -> &RepositoryConfig {
        &self.config
    }

    fn schema(&self) -> Option<&str> {
        self.config.schema.as_deref()
    }
}

fn bind_params<'q, O>(
    mut query: QueryAs<'q, Postgres, O, PgArguments>,
    params: &'q [Value],
) -> QueryAs<'q, Postgres, O, PgArguments> {
    for param in params {
        query = match param {
            Value::Bool(b) => query.bind(*b),
            Value::Int(i) => query.bind(*i),
            Value::Float(f) => query.bind(*f),
            Value::Text(s) => query.bind(s.as_str()),
            Value::Decimal(d) => query.bind(*d),
            Value::Timestamp(t) => query.bind(*t),
            Value::Uuid(u) => query.bind(*u),
        };
    }
    query
}

fn log_query(query: &SqlQuery) {
    debug!(
        sql = %query.sql,
        params = query.params.len(),
        "Executing specification query"
    );
    trace!(
        params = %serde_json::Value::Array(query.params.iter().map(crate::value::Value::to_json).collect()),
        "Bound specification parameters"
    );
}

#[async_trait]
impl<T> SpecificationExecutor<T> for PgRepository<T>
where
    T: Entity + for<'r> FromRow<'r, PgRow> + Unpin,
{
    async fn find_all_with(
        &self,
        spec: &Specification<T>,
        options: &QueryOptions,
    ) -> Result<Vec<T>> {
        let query = build_select(spec, options, self.schema());
        log_query(&query);

        let rows = bind_params(sqlx::query_as::<_, T>(&query.sql), &query.params)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn count(&self, spec: &Specification<T>) -> Result<i64> {
        let query = build_count(spec, self.schema());
        log_query(&query);

        let (count,) = bind_params(sqlx::query_as::<_, (i64,)>(&query.sql), &query.params)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn exists(&self, spec: &Specification<T>) -> Result<bool> {
        let query = build_exists(spec, self.schema());
        log_query(&query);

        let (exists,) = bind_params(sqlx::query_as::<_, (bool,)>(&query.sql), &query.params)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }
}
