//! Criteria API: predicate tree, query roots, joins and the predicate factory
//!
//! This is the layer specifications are realized against. A [`Root`] is
//! created per realization, joins are registered on it as they are
//! navigated, and the [`CriteriaBuilder`] turns typed paths and values into
//! [`Predicate`] nodes. Rendering to SQL lives in [`crate::sql`], in-memory
//! evaluation in [`crate::memory`].

use std::cell::RefCell;
use std::fmt;
use std::marker::PhantomData;

use crate::entity::{Collection, Embedded, Entity, Field, Numeric, Reference};
use crate::value::Value;

// ============================================================================
// Predicate tree
// ============================================================================

/// Where a column is read from: the query root or one of its joins
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Root,
    /// Index into the root's join list
    Join(usize),
}

/// An embedded value object a column is nested in
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmbeddedRef {
    /// Property holding the nested object in records
    pub property: &'static str,
    /// Prefix of the flattened columns in the table
    pub column_prefix: &'static str,
}

/// A column on the root or on a joined table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnRef {
    pub source: Source,
    /// Embedded objects enclosing the attribute, outermost first
    pub embedded: Vec<EmbeddedRef>,
    pub name: &'static str,
}

impl ColumnRef {
    /// A top-level attribute of `source`
    pub fn new(source: Source, name: &'static str) -> Self {
        Self {
            source,
            embedded: Vec::new(),
            name,
        }
    }

    /// Name of the column in the table, with embedded prefixes applied
    pub fn column_name(&self) -> String {
        let mut column: String = self.embedded.iter().map(|e| e.column_prefix).collect();
        column.push_str(self.name);
        column
    }
}

/// A one-to-many relation resolved against its owning source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionRef {
    /// Source holding the owning row
    pub owner: Source,
    /// Primary key column of the owning row
    pub owner_key: &'static str,
    /// Property on the owning record holding the related records
    pub property: &'static str,
    /// Table of the related entity
    pub table: &'static str,
    /// Column on `table` referencing `owner_key`
    pub foreign_key: &'static str,
    /// Primary key column of the related entity
    pub target_key: &'static str,
}

/// A to-one relation resolved against its owning source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceRef {
    /// Source holding the owning row
    pub owner: Source,
    /// Property on the owning record holding the related record
    pub property: &'static str,
    /// Column on the owning row holding the related primary key
    pub foreign_key: &'static str,
    /// Table of the related entity
    pub table: &'static str,
    /// Primary key column of the related entity
    pub target_key: &'static str,
}

/// The relation a join follows
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JoinRelation {
    /// Any number of related rows point back at the owner
    Collection(CollectionRef),
    /// The owner points at zero or one related row
    Reference(ReferenceRef),
}

impl JoinRelation {
    pub fn owner(&self) -> Source {
        match self {
            JoinRelation::Collection(c) => c.owner,
            JoinRelation::Reference(r) => r.owner,
        }
    }

    pub fn property(&self) -> &'static str {
        match self {
            JoinRelation::Collection(c) => c.property,
            JoinRelation::Reference(r) => r.property,
        }
    }

    pub fn table(&self) -> &'static str {
        match self {
            JoinRelation::Collection(c) => c.table,
            JoinRelation::Reference(r) => r.table,
        }
    }

    /// Columns the join matches: (on the joined table, on the owning row)
    pub fn join_columns(&self) -> (&'static str, &'static str) {
        match self {
            JoinRelation::Collection(c) => (c.foreign_key, c.owner_key),
            JoinRelation::Reference(r) => (r.target_key, r.foreign_key),
        }
    }
}

/// An inner join registered on a query root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinClause {
    pub index: usize,
    pub relation: JoinRelation,
}

/// A relation from `O` to `E` that can be joined
pub trait Relation<O, E> {
    fn resolve(self, owner: Source) -> JoinRelation;
}

impl<O: Entity, E: Entity> Relation<O, E> for Collection<O, E> {
    fn resolve(self, owner: Source) -> JoinRelation {
        JoinRelation::Collection(relation(owner, self))
    }
}

impl<O: Entity, E: Entity> Relation<O, E> for Reference<O, E> {
    fn resolve(self, owner: Source) -> JoinRelation {
        JoinRelation::Reference(ReferenceRef {
            owner,
            property: self.name(),
            foreign_key: self.foreign_key(),
            table: E::TABLE,
            target_key: E::PRIMARY_KEY,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl CompareOp {
    pub fn as_sql(&self) -> &'static str {
        match self {
            CompareOp::Eq => "=",
            CompareOp::Ne => "<>",
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
            CompareOp::Gt => ">",
            CompareOp::Ge => ">=",
        }
    }
}

/// A boolean expression node
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// All children hold; empty is always true
    Conjunction(Vec<Predicate>),
    /// Any child holds; empty is always false
    Disjunction(Vec<Predicate>),
    Not(Box<Predicate>),
    Compare {
        column: ColumnRef,
        op: CompareOp,
        value: Value,
    },
    Between {
        column: ColumnRef,
        low: Value,
        high: Value,
    },
    In {
        column: ColumnRef,
        values: Vec<Value>,
    },
    IsNull {
        column: ColumnRef,
        negated: bool,
    },
    Boolean {
        column: ColumnRef,
        value: bool,
    },
    Like {
        column: ColumnRef,
        pattern: String,
        escape: Option<char>,
        negated: bool,
    },
    Empty {
        collection: CollectionRef,
        negated: bool,
    },
    Member {
        collection: CollectionRef,
        key: Value,
        negated: bool,
    },
}

// ============================================================================
// Roots, joins and paths
// ============================================================================

/// Typed path to a column of type `R`
pub struct Path<R> {
    column: ColumnRef,
    _marker: PhantomData<fn() -> R>,
}

impl<R> Path<R> {
    fn new(column: ColumnRef) -> Self {
        Self {
            column,
            _marker: PhantomData,
        }
    }

    pub fn column(&self) -> &ColumnRef {
        &self.column
    }

    fn into_column(self) -> ColumnRef {
        self.column
    }
}

impl<R> Clone for Path<R> {
    fn clone(&self) -> Self {
        Self {
            column: self.column.clone(),
            _marker: PhantomData,
        }
    }
}

impl<R> fmt::Debug for Path<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Path").field(&self.column).finish()
    }
}

/// Typed path to a collection of `E`, used by the emptiness and membership predicates
pub struct CollectionPath<E> {
    collection: CollectionRef,
    _marker: PhantomData<fn() -> E>,
}

impl<E> CollectionPath<E> {
    pub fn collection(&self) -> &CollectionRef {
        &self.collection
    }
}

impl<E> Clone for CollectionPath<E> {
    fn clone(&self) -> Self {
        Self {
            collection: self.collection.clone(),
            _marker: PhantomData,
        }
    }
}

impl<E> fmt::Debug for CollectionPath<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("CollectionPath").field(&self.collection).finish()
    }
}

/// Typed path to an embedded value object `S`
pub struct EmbeddedPath<S> {
    source: Source,
    embedded: Vec<EmbeddedRef>,
    _marker: PhantomData<fn() -> S>,
}

impl<S> EmbeddedPath<S> {
    fn new(source: Source, embedded: Vec<EmbeddedRef>) -> Self {
        Self {
            source,
            embedded,
            _marker: PhantomData,
        }
    }

    /// Path to an attribute of the embedded object
    pub fn get<R>(&self, field: Field<S, R>) -> Path<R> {
        Path::new(ColumnRef {
            source: self.source,
            embedded: self.embedded.clone(),
            name: field.name(),
        })
    }

    /// Path to a value object embedded in this one
    pub fn embedded<N>(&self, embedded: Embedded<S, N>) -> EmbeddedPath<N> {
        let mut chain = self.embedded.clone();
        chain.push(embedded_ref(embedded));
        EmbeddedPath::new(self.source, chain)
    }
}

impl<S> Clone for EmbeddedPath<S> {
    fn clone(&self) -> Self {
        Self::new(self.source, self.embedded.clone())
    }
}

impl<S> fmt::Debug for EmbeddedPath<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmbeddedPath")
            .field("source", &self.source)
            .field("embedded", &self.embedded)
            .finish()
    }
}

fn embedded_ref<T, S>(embedded: Embedded<T, S>) -> EmbeddedRef {
    EmbeddedRef {
        property: embedded.name(),
        column_prefix: embedded.column_prefix(),
    }
}

fn relation<O: Entity, E: Entity>(owner: Source, collection: Collection<O, E>) -> CollectionRef {
    CollectionRef {
        owner,
        owner_key: O::PRIMARY_KEY,
        property: collection.name(),
        table: E::TABLE,
        foreign_key: collection.foreign_key(),
        target_key: E::PRIMARY_KEY,
    }
}

fn register_join(joins: &RefCell<Vec<JoinClause>>, relation: JoinRelation) -> Source {
    let mut joins = joins.borrow_mut();
    let index = joins.len();
    joins.push(JoinClause { index, relation });
    Source::Join(index)
}

/// Query root for entity `T`
///
/// A fresh root is created every time a specification is realized. Joins
/// navigated through it are recorded so they can be rendered (or evaluated)
/// alongside the predicate.
pub struct Root<T> {
    joins: RefCell<Vec<JoinClause>>,
    _entity: PhantomData<fn() -> T>,
}

impl<T: Entity> Root<T> {
    pub fn new() -> Self {
        Self {
            joins: RefCell::new(Vec::new()),
            _entity: PhantomData,
        }
    }

    /// Path to an attribute of the root entity
    pub fn get<R>(&self, field: Field<T, R>) -> Path<R> {
        Path::new(ColumnRef::new(Source::Root, field.name()))
    }

    /// Path into a value object embedded in the root entity
    pub fn embedded<S>(&self, embedded: Embedded<T, S>) -> EmbeddedPath<S> {
        EmbeddedPath::new(Source::Root, vec![embedded_ref(embedded)])
    }

    /// Inner join to a related collection or reference
    pub fn join<E: Entity>(&self, relation: impl Relation<T, E>) -> Join<'_, E> {
        let source = register_join(&self.joins, relation.resolve(Source::Root));
        Join {
            joins: &self.joins,
            source,
            _entity: PhantomData,
        }
    }

    /// The collection itself, without joining it
    pub fn collection<E: Entity>(&self, collection: Collection<T, E>) -> CollectionPath<E> {
        CollectionPath {
            collection: relation(Source::Root, collection),
            _marker: PhantomData,
        }
    }

    /// Joins registered so far, in registration order
    pub fn joins(&self) -> Vec<JoinClause> {
        self.joins.borrow().clone()
    }
}

impl<T: Entity> Default for Root<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Root<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Root")
            .field("joins", &self.joins.borrow())
            .finish()
    }
}

/// A joined entity `E`, borrowed from the root it was registered on
pub struct Join<'r, E> {
    joins: &'r RefCell<Vec<JoinClause>>,
    source: Source,
    _entity: PhantomData<fn() -> E>,
}

impl<'r, E: Entity> Join<'r, E> {
    pub fn get<R>(&self, field: Field<E, R>) -> Path<R> {
        Path::new(ColumnRef::new(self.source, field.name()))
    }

    pub fn embedded<S>(&self, embedded: Embedded<E, S>) -> EmbeddedPath<S> {
        EmbeddedPath::new(self.source, vec![embedded_ref(embedded)])
    }

    pub fn join<F: Entity>(&self, relation: impl Relation<E, F>) -> Join<'r, F> {
        let source = register_join(self.joins, relation.resolve(self.source));
        Join {
            joins: self.joins,
            source,
            _entity: PhantomData,
        }
    }

    pub fn collection<F: Entity>(&self, collection: Collection<E, F>) -> CollectionPath<F> {
        CollectionPath {
            collection: relation(self.source, collection),
            _marker: PhantomData,
        }
    }
}

impl<E> fmt::Debug for Join<'_, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Join").field(&self.source).finish()
    }
}

// ============================================================================
// Predicate factory
// ============================================================================

/// Factory for predicates over typed paths
#[derive(Debug, Clone, Copy, Default)]
pub struct CriteriaBuilder;

impl CriteriaBuilder {
    fn compare<R: Into<Value>>(&self, path: Path<R>, op: CompareOp, x: impl Into<R>) -> Predicate {
        let x: R = x.into();
        Predicate::Compare {
            column: path.into_column(),
            op,
            value: x.into(),
        }
    }

    pub fn equal<R: Into<Value>>(&self, path: Path<R>, x: impl Into<R>) -> Predicate {
        self.compare(path, CompareOp::Eq, x)
    }

    pub fn not_equal<R: Into<Value>>(&self, path: Path<R>, x: impl Into<R>) -> Predicate {
        self.compare(path, CompareOp::Ne, x)
    }

    pub fn lt<R: Numeric>(&self, path: Path<R>, x: impl Into<R>) -> Predicate {
        self.compare(path, CompareOp::Lt, x)
    }

    pub fn le<R: Numeric>(&self, path: Path<R>, x: impl Into<R>) -> Predicate {
        self.compare(path, CompareOp::Le, x)
    }

    pub fn gt<R: Numeric>(&self, path: Path<R>, x: impl Into<R>) -> Predicate {
        self.compare(path, CompareOp::Gt, x)
    }

    pub fn ge<R: Numeric>(&self, path: Path<R>, x: impl Into<R>) -> Predicate {
        self.compare(path, CompareOp::Ge, x)
    }

    pub fn less_than<R: PartialOrd + Into<Value>>(&self, path: Path<R>, x: impl Into<R>) -> Predicate {
        self.compare(path, CompareOp::Lt, x)
    }

    pub fn less_than_or_equal_to<R: PartialOrd + Into<Value>>(
        &self,
        path: Path<R>,
        x: impl Into<R>,
    ) -> Predicate {
        self.compare(path, CompareOp::Le, x)
    }

    pub fn greater_than<R: PartialOrd + Into<Value>>(
        &self,
        path: Path<R>,
        x: impl Into<R>,
    ) -> Predicate {
        self.compare(path, CompareOp::Gt, x)
    }

    pub fn greater_than_or_equal_to<R: PartialOrd + Into<Value>>(
        &self,
        path: Path<R>,
        x: impl Into<R>,
    ) -> Predicate {
        self.compare(path, CompareOp::Ge, x)
    }

    pub fn between<R: PartialOrd + Into<Value>>(
        &self,
        path: Path<R>,
        x: impl Into<R>,
        y: impl Into<R>,
    ) -> Predicate {
        let (x, y): (R, R) = (x.into(), y.into());
        Predicate::Between {
            column: path.into_column(),
            low: x.into(),
            high: y.into(),
        }
    }

    /// Membership in a value list. An empty list never matches.
    pub fn is_in<R, I>(&self, path: Path<R>, values: I) -> Predicate
    where
        R: Into<Value>,
        I: IntoIterator,
        I::Item: Into<R>,
    {
        Predicate::In {
            column: path.into_column(),
            values: values
                .into_iter()
                .map(|v| {
                    let v: R = v.into();
                    v.into()
                })
                .collect(),
        }
    }

    pub fn is_true(&self, path: Path<bool>) -> Predicate {
        Predicate::Boolean {
            column: path.into_column(),
            value: true,
        }
    }

    pub fn is_false(&self, path: Path<bool>) -> Predicate {
        Predicate::Boolean {
            column: path.into_column(),
            value: false,
        }
    }

    pub fn is_null<R>(&self, path: Path<R>) -> Predicate {
        Predicate::IsNull {
            column: path.into_column(),
            negated: false,
        }
    }

    pub fn is_not_null<R>(&self, path: Path<R>) -> Predicate {
        Predicate::IsNull {
            column: path.into_column(),
            negated: true,
        }
    }

    pub fn is_empty<E>(&self, collection: CollectionPath<E>) -> Predicate {
        Predicate::Empty {
            collection: collection.collection,
            negated: false,
        }
    }

    pub fn is_not_empty<E>(&self, collection: CollectionPath<E>) -> Predicate {
        Predicate::Empty {
            collection: collection.collection,
            negated: true,
        }
    }

    /// Whether `elem` (matched by primary key) belongs to the collection
    pub fn is_member<E: Entity>(&self, elem: &E, collection: CollectionPath<E>) -> Predicate {
        Predicate::Member {
            collection: collection.collection,
            key: elem.id(),
            negated: false,
        }
    }

    pub fn is_not_member<E: Entity>(&self, elem: &E, collection: CollectionPath<E>) -> Predicate {
        Predicate::Member {
            collection: collection.collection,
            key: elem.id(),
            negated: true,
        }
    }

    fn like_predicate(
        &self,
        path: Path<String>,
        pattern: impl Into<String>,
        escape: Option<char>,
        negated: bool,
    ) -> Predicate {
        Predicate::Like {
            column: path.into_column(),
            pattern: pattern.into(),
            escape,
            negated,
        }
    }

    pub fn like(&self, path: Path<String>, pattern: impl Into<String>) -> Predicate {
        self.like_predicate(path, pattern, None, false)
    }

    pub fn like_escaped(
        &self,
        path: Path<String>,
        pattern: impl Into<String>,
        escape: char,
    ) -> Predicate {
        self.like_predicate(path, pattern, Some(escape), false)
    }

    pub fn not_like(&self, path: Path<String>, pattern: impl Into<String>) -> Predicate {
        self.like_predicate(path, pattern, None, true)
    }

    pub fn not_like_escaped(
        &self,
        path: Path<String>,
        pattern: impl Into<String>,
        escape: char,
    ) -> Predicate {
        self.like_predicate(path, pattern, Some(escape), true)
    }

    /// Conjunction of two predicates; nested conjunctions are flattened
    pub fn and(&self, x: Predicate, y: Predicate) -> Predicate {
        let mut terms = Vec::new();
        for p in [x, y] {
            match p {
                Predicate::Conjunction(inner) => terms.extend(inner),
                other => terms.push(other),
            }
        }
        Predicate::Conjunction(terms)
    }

    /// Disjunction of two predicates; nested disjunctions are flattened
    pub fn or(&self, x: Predicate, y: Predicate) -> Predicate {
        let mut terms = Vec::new();
        for p in [x, y] {
            match p {
                Predicate::Disjunction(inner) => terms.extend(inner),
                other => terms.push(other),
            }
        }
        Predicate::Disjunction(terms)
    }

    pub fn not(&self, restriction: Predicate) -> Predicate {
        Predicate::Not(Box::new(restriction))
    }

    /// Always true
    pub fn conjunction(&self) -> Predicate {
        Predicate::Conjunction(Vec::new())
    }

    /// Always false
    pub fn disjunction(&self) -> Predicate {
        Predicate::Disjunction(Vec::new())
    }
}
