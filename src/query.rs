//! Ordering and paging options for executing specifications

use crate::entity::Field;

/// Sort direction. PostgreSQL places nulls last ascending and first descending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

impl Direction {
    pub fn as_sql(&self) -> &'static str {
        match self {
            Direction::Asc => "ASC",
            Direction::Desc => "DESC",
        }
    }
}

/// A single ordering term on a root column
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub column: &'static str,
    pub direction: Direction,
}

/// Ordered list of sort terms, built from typed fields
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Sort {
    orders: Vec<Order>,
}

impl Sort {
    /// No ordering
    pub fn unsorted() -> Self {
        Self::default()
    }

    /// Sort ascending by `field`
    pub fn by<T, R>(field: Field<T, R>) -> Self {
        Self::unsorted().then(field, Direction::Asc)
    }

    /// Sort descending by `field`
    pub fn by_desc<T, R>(field: Field<T, R>) -> Self {
        Self::unsorted().then(field, Direction::Desc)
    }

    /// Add a tie-breaking term
    pub fn then<T, R>(mut self, field: Field<T, R>, direction: Direction) -> Self {
        self.orders.push(Order {
            column: field.name(),
            direction,
        });
        self
    }

    pub fn orders(&self) -> &[Order] {
        &self.orders
    }

    pub fn is_unsorted(&self) -> bool {
        self.orders.is_empty()
    }
}

/// A window of results
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    /// Number of results to skip
    pub offset: i64,
    /// Maximum number of results to return
    pub limit: i64,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: 100,
        }
    }
}

impl PageRequest {
    pub fn new(offset: i64, limit: i64) -> Self {
        Self { offset, limit }
    }

    /// Zero-based page number of the given size
    pub fn of(page: i64, size: i64) -> Self {
        Self {
            offset: page.saturating_mul(size),
            limit: size,
        }
    }
}

/// Sorting and paging applied on top of a specification
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryOptions {
    pub sort: Sort,
    pub page: Option<PageRequest>,
}

impl QueryOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set sorting
    pub fn with_sort(mut self, sort: Sort) -> Self {
        self.sort = sort;
        self
    }

    /// Set pagination
    pub fn with_page(mut self, page: PageRequest) -> Self {
        self.page = Some(page);
        self
    }
}
