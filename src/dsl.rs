//! Property-reference predicate builders
//!
//! One method per comparison, each turning a typed [`Field`] (or
//! [`Collection`]) and a value into a [`Specification`]. Values are captured
//! when the specification is built and bound every time it is realized.

use crate::criteria::{CriteriaBuilder, Path, Predicate};
use crate::entity::{Collection, Entity, Field, Numeric};
use crate::specification::Specification;
use crate::value::Value;

fn spec<T, R, F>(field: Field<T, R>, make: F) -> Specification<T>
where
    T: Entity,
    R: 'static,
    F: Fn(&CriteriaBuilder, Path<R>) -> Predicate + Send + Sync + 'static,
{
    Specification::new(move |root, cb| make(cb, root.get(field)))
}

// Equality and membership
impl<T, R> Field<T, R>
where
    T: Entity,
    R: Into<Value> + Clone + Send + Sync + 'static,
{
    pub fn equal(self, x: impl Into<R>) -> Specification<T> {
        let x: R = x.into();
        spec(self, move |cb, path| cb.equal(path, x.clone()))
    }

    pub fn not_equal(self, x: impl Into<R>) -> Specification<T> {
        let x: R = x.into();
        spec(self, move |cb, path| cb.not_equal(path, x.clone()))
    }

    /// Membership in `values`. An empty input yields the unrestricted
    /// specification instead of a predicate that can never match.
    pub fn is_in<I>(self, values: I) -> Specification<T>
    where
        I: IntoIterator,
        I::Item: Into<R>,
    {
        let values: Vec<R> = values.into_iter().map(Into::into).collect();
        if values.is_empty() {
            return Specification::unrestricted();
        }
        spec(self, move |cb, path| cb.is_in(path, values.clone()))
    }
}

// Null checks
impl<T: Entity, R: 'static> Field<T, R> {
    pub fn is_null(self) -> Specification<T> {
        spec(self, |cb, path| cb.is_null(path))
    }

    pub fn is_not_null(self) -> Specification<T> {
        spec(self, |cb, path| cb.is_not_null(path))
    }
}

// Numeric comparisons
impl<T, R> Field<T, R>
where
    T: Entity,
    R: Numeric + Clone + Send + Sync + 'static,
{
    pub fn lt(self, x: impl Into<R>) -> Specification<T> {
        let x: R = x.into();
        spec(self, move |cb, path| cb.lt(path, x.clone()))
    }

    pub fn le(self, x: impl Into<R>) -> Specification<T> {
        let x: R = x.into();
        spec(self, move |cb, path| cb.le(path, x.clone()))
    }

    pub fn gt(self, x: impl Into<R>) -> Specification<T> {
        let x: R = x.into();
        spec(self, move |cb, path| cb.gt(path, x.clone()))
    }

    pub fn ge(self, x: impl Into<R>) -> Specification<T> {
        let x: R = x.into();
        spec(self, move |cb, path| cb.ge(path, x.clone()))
    }
}

// Ordered comparisons
impl<T, R> Field<T, R>
where
    T: Entity,
    R: PartialOrd + Into<Value> + Clone + Send + Sync + 'static,
{
    pub fn less_than(self, x: impl Into<R>) -> Specification<T> {
        let x: R = x.into();
        spec(self, move |cb, path| cb.less_than(path, x.clone()))
    }

    pub fn less_than_or_equal_to(self, x: impl Into<R>) -> Specification<T> {
        let x: R = x.into();
        spec(self, move |cb, path| cb.less_than_or_equal_to(path, x.clone()))
    }

    pub fn greater_than(self, x: impl Into<R>) -> Specification<T> {
        let x: R = x.into();
        spec(self, move |cb, path| cb.greater_than(path, x.clone()))
    }

    pub fn greater_than_or_equal_to(self, x: impl Into<R>) -> Specification<T> {
        let x: R = x.into();
        spec(self, move |cb, path| {
            cb.greater_than_or_equal_to(path, x.clone())
        })
    }

    /// Inclusive on both ends
    pub fn between(self, x: impl Into<R>, y: impl Into<R>) -> Specification<T> {
        let (x, y): (R, R) = (x.into(), y.into());
        spec(self, move |cb, path| cb.between(path, x.clone(), y.clone()))
    }
}

impl<T: Entity> Field<T, bool> {
    pub fn is_true(self) -> Specification<T> {
        spec(self, |cb, path| cb.is_true(path))
    }

    pub fn is_false(self) -> Specification<T> {
        spec(self, |cb, path| cb.is_false(path))
    }
}

// String matching. `%` matches any run of characters, `_` exactly one.
impl<T: Entity> Field<T, String> {
    pub fn like(self, pattern: impl Into<String>) -> Specification<T> {
        let pattern = pattern.into();
        spec(self, move |cb, path| cb.like(path, pattern.clone()))
    }

    pub fn like_escaped(self, pattern: impl Into<String>, escape: char) -> Specification<T> {
        let pattern = pattern.into();
        spec(self, move |cb, path| {
            cb.like_escaped(path, pattern.clone(), escape)
        })
    }

    pub fn not_like(self, pattern: impl Into<String>) -> Specification<T> {
        let pattern = pattern.into();
        spec(self, move |cb, path| cb.not_like(path, pattern.clone()))
    }

    pub fn not_like_escaped(self, pattern: impl Into<String>, escape: char) -> Specification<T> {
        let pattern = pattern.into();
        spec(self, move |cb, path| {
            cb.not_like_escaped(path, pattern.clone(), escape)
        })
    }
}

impl<T: Entity, E: Entity> Collection<T, E> {
    pub fn is_empty(self) -> Specification<T> {
        Specification::new(move |root, cb| cb.is_empty(root.collection(self)))
    }

    pub fn is_not_empty(self) -> Specification<T> {
        Specification::new(move |root, cb| cb.is_not_empty(root.collection(self)))
    }

    /// Matches owners whose collection contains `elem` (compared by primary key)
    pub fn is_member(self, elem: &E) -> Specification<T> {
        self.membership(elem.id(), false)
    }

    pub fn is_not_member(self, elem: &E) -> Specification<T> {
        self.membership(elem.id(), true)
    }

    fn membership(self, key: Value, negated: bool) -> Specification<T> {
        Specification::new(move |root, _| Predicate::Member {
            collection: root.collection(self).collection().clone(),
            key: key.clone(),
            negated,
        })
    }
}
