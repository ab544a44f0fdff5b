//! Composable query fragments
//!
//! A [`Specification`] is a deferred predicate: realized against a fresh
//! [`Root`] each time a query is built. The unrestricted specification
//! carries no predicate at all and is the identity for both `and` and `or`,
//! so optional filters can be folded together without special cases.

use std::fmt;
use std::ops::{BitAnd, BitOr, Not};
use std::sync::Arc;

use crate::criteria::{CriteriaBuilder, Predicate, Root};
use crate::entity::Entity;

type PredicateFn<T> = dyn Fn(&Root<T>, &CriteriaBuilder) -> Predicate + Send + Sync;

/// A deferred, composable query constraint over entity `T`
pub struct Specification<T> {
    predicate: Option<Arc<PredicateFn<T>>>,
}

impl<T: Entity> Specification<T> {
    /// Build a specification from a closure over the root and the criteria builder
    ///
    /// ```
    /// # use criteria_dsl::{Entity, Field, Specification, Value};
    /// # #[derive(serde::Serialize)]
    /// # struct Show { id: i32 }
    /// # impl Entity for Show {
    /// #     const TABLE: &'static str = "show";
    /// #     fn id(&self) -> Value { self.id.into() }
    /// # }
    /// const ID: Field<Show, i32> = Field::new("id");
    ///
    /// let spec = Specification::<Show>::new(|root, cb| cb.gt(root.get(ID), 10));
    /// assert!(!spec.is_unrestricted());
    /// ```
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Root<T>, &CriteriaBuilder) -> Predicate + Send + Sync + 'static,
    {
        Self {
            predicate: Some(Arc::new(f)),
        }
    }

    /// The specification that places no constraint on the query
    pub fn unrestricted() -> Self {
        Self { predicate: None }
    }

    pub fn is_unrestricted(&self) -> bool {
        self.predicate.is_none()
    }

    /// Realize the predicate against a root; `None` means no constraint
    pub fn to_predicate(&self, root: &Root<T>) -> Option<Predicate> {
        self.predicate.as_ref().map(|f| f(root, &CriteriaBuilder))
    }

    /// Both constraints must hold
    pub fn and(self, other: Specification<T>) -> Specification<T> {
        match (self.predicate, other.predicate) {
            (None, rhs) => Self { predicate: rhs },
            (lhs, None) => Self { predicate: lhs },
            (Some(lhs), Some(rhs)) => Self::new(move |root, cb| {
                let x = lhs(root, cb);
                let y = rhs(root, cb);
                cb.and(x, y)
            }),
        }
    }

    /// Either constraint must hold
    pub fn or(self, other: Specification<T>) -> Specification<T> {
        match (self.predicate, other.predicate) {
            (None, rhs) => Self { predicate: rhs },
            (lhs, None) => Self { predicate: lhs },
            (Some(lhs), Some(rhs)) => Self::new(move |root, cb| {
                let x = lhs(root, cb);
                let y = rhs(root, cb);
                cb.or(x, y)
            }),
        }
    }

    /// The complement of this constraint. Negating the unrestricted
    /// specification leaves it unrestricted.
    pub fn negate(self) -> Specification<T> {
        match self.predicate {
            None => Self::unrestricted(),
            Some(inner) => Self::new(move |root, cb| {
                let p = inner(root, cb);
                cb.not(p)
            }),
        }
    }
}

impl<T> Clone for Specification<T> {
    fn clone(&self) -> Self {
        Self {
            predicate: self.predicate.clone(),
        }
    }
}

impl<T: Entity> Default for Specification<T> {
    fn default() -> Self {
        Self::unrestricted()
    }
}

impl<T> fmt::Debug for Specification<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Specification")
            .field("unrestricted", &self.predicate.is_none())
            .finish()
    }
}

impl<T: Entity> BitAnd for Specification<T> {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self::Output {
        self.and(rhs)
    }
}

impl<T: Entity> BitOr for Specification<T> {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        self.or(rhs)
    }
}

impl<T: Entity> Not for Specification<T> {
    type Output = Self;

    fn not(self) -> Self::Output {
        self.negate()
    }
}

// ============================================================================
// Folding combinators
// ============================================================================

/// Anything that may contribute a specification to [`and`] / [`or`]
///
/// `None` contributes nothing, which is how optional filters drop out.
pub trait IntoSpecification<T> {
    fn into_specification(self) -> Option<Specification<T>>;
}

impl<T> IntoSpecification<T> for Specification<T> {
    fn into_specification(self) -> Option<Specification<T>> {
        Some(self)
    }
}

impl<T> IntoSpecification<T> for Option<Specification<T>> {
    fn into_specification(self) -> Option<Specification<T>> {
        self
    }
}

impl<T> IntoSpecification<T> for &Specification<T> {
    fn into_specification(self) -> Option<Specification<T>> {
        Some(self.clone())
    }
}

fn combine<T, I>(specs: I, op: fn(Specification<T>, Specification<T>) -> Specification<T>) -> Specification<T>
where
    T: Entity,
    I: IntoIterator,
    I::Item: IntoSpecification<T>,
{
    specs
        .into_iter()
        .filter_map(IntoSpecification::into_specification)
        .fold(Specification::unrestricted(), op)
}

/// Conjunction of every present specification; unrestricted when none are present
pub fn and<T, I>(specs: I) -> Specification<T>
where
    T: Entity,
    I: IntoIterator,
    I::Item: IntoSpecification<T>,
{
    combine(specs, Specification::and)
}

/// Disjunction of every present specification; unrestricted when none are present
pub fn or<T, I>(specs: I) -> Specification<T>
where
    T: Entity,
    I: IntoIterator,
    I::Item: IntoSpecification<T>,
{
    combine(specs, Specification::or)
}

pub fn not<T: Entity>(spec: Specification<T>) -> Specification<T> {
    spec.negate()
}

/// Variadic [`and`](fn@crate::and) over specifications and optional specifications
///
/// ```ignore
/// let spec = criteria_dsl::and!(has_name(name), Show::ACTIVE.is_true());
/// ```
#[macro_export]
macro_rules! and {
    ($($spec:expr),+ $(,)?) => {
        $crate::and([$($crate::IntoSpecification::into_specification($spec)),+])
    };
}

/// Variadic [`or`](fn@crate::or) over specifications and optional specifications
#[macro_export]
macro_rules! or {
    ($($spec:expr),+ $(,)?) => {
        $crate::or([$($crate::IntoSpecification::into_specification($spec)),+])
    };
}
