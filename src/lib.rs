//! # criteria-dsl
//!
//! Type-safe, composable query specifications for PostgreSQL.
//!
//! Entities expose typed [`Field`] and [`Collection`] references instead of
//! string column names. Each reference offers one method per comparison and
//! yields a [`Specification`]: a deferred predicate that a repository
//! realizes when it runs a query. Specifications combine with `&`, `|` and
//! `!`, and with the null-tolerant [`and`](fn@and) / [`or`](fn@or) folds, so
//! optional filters simply drop out of a query.
//!
//! ## Features
//!
//! - **Typed Property References**: comparisons are checked against the
//!   attribute's type; numeric shorthands only exist for numeric fields
//! - **Null-Safe Composition**: the unrestricted specification is the identity
//!   for AND and OR
//! - **Empty-Collection Guard**: `is_in` with no values places no constraint
//! - **Joins and Collections**: navigate to-many and to-one relations with inner
//!   joins, reach into embedded value objects, test emptiness and membership
//! - **Two Executors**: PostgreSQL via `sqlx`, and an in-memory repository with
//!   the same three-valued matching rules
//! - **SQL Injection Prevention**: identifiers are quoted, values are bound
//!
//! ## Quick Start
//!
//! ```rust
//! use criteria_dsl::{Entity, Field, InMemoryRepository, Specification, SpecificationExecutor, Value};
//! use serde::Serialize;
//!
//! #[derive(Debug, Clone, Serialize)]
//! struct Show {
//!     id: i32,
//!     name: String,
//!     release_date: Option<String>,
//! }
//!
//! impl Entity for Show {
//!     const TABLE: &'static str = "tv_show";
//!     fn id(&self) -> Value {
//!         self.id.into()
//!     }
//! }
//!
//! impl Show {
//!     const NAME: Field<Show, String> = Field::new("name");
//!     const RELEASE_DATE: Field<Show, String> = Field::new("release_date");
//! }
//!
//! fn has_name(name: Option<&str>) -> Option<Specification<Show>> {
//!     name.map(|n| Show::NAME.equal(n))
//! }
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> criteria_dsl::Result<()> {
//! let repo = InMemoryRepository::new();
//! repo.save(Show { id: 1, name: "Hemlock Grove".into(), release_date: Some("2013".into()) }).await;
//! repo.save(Show { id: 2, name: "Better Call Saul".into(), release_date: None }).await;
//!
//! let spec = criteria_dsl::and!(has_name(None), Show::RELEASE_DATE.is_in(["2013", "2015"]));
//! let shows = repo.find_all(&spec).await?;
//! assert_eq!(shows.len(), 1);
//! # Ok(())
//! # }
//! ```
//!
//! ## PostgreSQL
//!
//! ```rust,no_run
//! use criteria_dsl::{PgRepository, RepositoryConfig};
//! # #[derive(serde::Serialize, sqlx::FromRow)]
//! # struct Show { id: i32 }
//! # impl criteria_dsl::Entity for Show {
//! #     const TABLE: &'static str = "tv_show";
//! #     fn id(&self) -> criteria_dsl::Value { self.id.into() }
//! # }
//!
//! # async fn run() -> criteria_dsl::Result<()> {
//! let config = RepositoryConfig::builder("postgres://localhost/mydb")
//!     .schema("media")      // Qualify tables (default: search_path)
//!     .max_connections(10)  // Pool size (default: 5)
//!     .build();
//! let shows = PgRepository::<Show>::connect(config).await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod criteria;
pub mod dsl;
pub mod entity;
pub mod error;
pub mod memory;
pub mod query;
pub mod repository;
pub mod specification;
pub mod sql;
pub mod value;

// Re-export main types for convenience
pub use config::{RepositoryConfig, RepositoryConfigBuilder};
pub use criteria::{
    CollectionPath, CriteriaBuilder, EmbeddedPath, Join, Path, Predicate, Relation, Root,
};
pub use entity::{Collection, Embedded, Entity, Field, Numeric, Reference};
pub use error::{CriteriaError, Result};
pub use memory::InMemoryRepository;
pub use query::{Direction, Order, PageRequest, QueryOptions, Sort};
pub use repository::{PgRepository, SpecificationExecutor};
pub use specification::{IntoSpecification, Specification, and, not, or};
pub use value::Value;

// Re-export SQL utilities for advanced users
pub use sql::{SqlQuery, build_count, build_exists, build_select};
