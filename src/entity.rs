//! Entities and typed property references
//!
//! A [`Field`] stands in for a string column name so that predicates are
//! checked against the attribute's type at compile time:
//!
//! ```
//! use criteria_dsl::{Collection, Entity, Field, Value};
//! use serde::Serialize;
//!
//! #[derive(Serialize)]
//! struct Rating {
//!     id: i32,
//!     stars: i32,
//! }
//!
//! #[derive(Serialize)]
//! struct Show {
//!     id: i32,
//!     name: String,
//!     ratings: Vec<Rating>,
//! }
//!
//! impl Entity for Rating {
//!     const TABLE: &'static str = "rating";
//!     fn id(&self) -> Value {
//!         self.id.into()
//!     }
//! }
//!
//! impl Entity for Show {
//!     const TABLE: &'static str = "show";
//!     fn id(&self) -> Value {
//!         self.id.into()
//!     }
//! }
//!
//! impl Show {
//!     const NAME: Field<Show, String> = Field::new("name");
//!     const RATINGS: Collection<Show, Rating> = Collection::new("ratings", "show_id");
//! }
//!
//! let by_name = Show::NAME.equal("Hemlock Grove");
//! let unrated = Show::RATINGS.is_empty();
//! let spec = by_name & unrated;
//! assert!(!spec.is_unrestricted());
//! ```

use std::fmt;
use std::marker::PhantomData;

use rust_decimal::Decimal;
use serde::Serialize;

use crate::value::Value;

/// A persistent type that specifications can be built for
///
/// Records are serialized with `serde` for in-memory evaluation, so field
/// names used in [`Field`] must match both the serialized keys and the
/// table's column names.
pub trait Entity: Serialize + Send + Sync + 'static {
    /// Table holding rows of this entity
    const TABLE: &'static str;

    /// Primary key column
    const PRIMARY_KEY: &'static str = "id";

    /// Primary key value of this instance
    fn id(&self) -> Value;
}

/// Typed reference to attribute `R` of entity `T`
///
/// Nullable columns (`Option<R>` in the entity) are declared as `Field<T, R>`.
pub struct Field<T, R> {
    name: &'static str,
    _marker: PhantomData<fn(&T) -> R>,
}

impl<T, R> Field<T, R> {
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            _marker: PhantomData,
        }
    }

    pub const fn name(&self) -> &'static str {
        self.name
    }
}

impl<T, R> Clone for Field<T, R> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T, R> Copy for Field<T, R> {}

impl<T, R> fmt::Debug for Field<T, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Field").field(&self.name).finish()
    }
}

/// Typed reference to a one-to-many relation from `T` to `E`
///
/// `name` is the property holding the related records and `foreign_key` the
/// column on `E`'s table that points back at `T`'s primary key.
pub struct Collection<T, E> {
    name: &'static str,
    foreign_key: &'static str,
    _marker: PhantomData<fn(&T) -> E>,
}

impl<T, E> Collection<T, E> {
    pub const fn new(name: &'static str, foreign_key: &'static str) -> Self {
        Self {
            name,
            foreign_key,
            _marker: PhantomData,
        }
    }

    pub const fn name(&self) -> &'static str {
        self.name
    }

    pub const fn foreign_key(&self) -> &'static str {
        self.foreign_key
    }
}

impl<T, E> Clone for Collection<T, E> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T, E> Copy for Collection<T, E> {}

impl<T, E> fmt::Debug for Collection<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Collection")
            .field("name", &self.name)
            .field("foreign_key", &self.foreign_key)
            .finish()
    }
}

/// Typed reference to a value object `S` stored inline in `T`'s row
///
/// Records hold `S` as a nested object under `name`. The table flattens its
/// attributes into columns named `column_prefix` followed by the attribute.
pub struct Embedded<T, S> {
    name: &'static str,
    column_prefix: &'static str,
    _marker: PhantomData<fn(&T) -> S>,
}

impl<T, S> Embedded<T, S> {
    pub const fn new(name: &'static str, column_prefix: &'static str) -> Self {
        Self {
            name,
            column_prefix,
            _marker: PhantomData,
        }
    }

    pub const fn name(&self) -> &'static str {
        self.name
    }

    pub const fn column_prefix(&self) -> &'static str {
        self.column_prefix
    }
}

impl<T, S> Clone for Embedded<T, S> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T, S> Copy for Embedded<T, S> {}

impl<T, S> fmt::Debug for Embedded<T, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Embedded")
            .field("name", &self.name)
            .field("column_prefix", &self.column_prefix)
            .finish()
    }
}

/// Typed reference to a to-one relation from `T` to `E`
///
/// `name` is the property holding the related record and `foreign_key` the
/// column on `T`'s table holding `E`'s primary key.
pub struct Reference<T, E> {
    name: &'static str,
    foreign_key: &'static str,
    _marker: PhantomData<fn(&T) -> E>,
}

impl<T, E> Reference<T, E> {
    pub const fn new(name: &'static str, foreign_key: &'static str) -> Self {
        Self {
            name,
            foreign_key,
            _marker: PhantomData,
        }
    }

    pub const fn name(&self) -> &'static str {
        self.name
    }

    pub const fn foreign_key(&self) -> &'static str {
        self.foreign_key
    }
}

impl<T, E> Clone for Reference<T, E> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T, E> Copy for Reference<T, E> {}

impl<T, E> fmt::Debug for Reference<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reference")
            .field("name", &self.name)
            .field("foreign_key", &self.foreign_key)
            .finish()
    }
}

/// Attribute types that support the numeric comparisons (`lt`, `le`, `gt`, `ge`)
pub trait Numeric: Into<Value> {}

impl Numeric for i16 {}
impl Numeric for i32 {}
impl Numeric for i64 {}
impl Numeric for u32 {}
impl Numeric for f32 {}
impl Numeric for f64 {}
impl Numeric for Decimal {}
