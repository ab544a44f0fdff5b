//! In-memory execution of specifications
//!
//! Records are serialized with `serde_json` and predicates are evaluated
//! with the same semantics PostgreSQL applies to the rendered SQL:
//!
//! - three-valued logic: comparing NULL is unknown, `NOT` of unknown is
//!   unknown, and only rows where the predicate is true match
//! - joins are inner joins: a record matches when some combination of its
//!   joined rows satisfies the predicate, and never when a joined
//!   collection is empty or a joined reference is null
//! - embedded value objects are nested objects in the record
//! - LIKE escapes with backslash unless another escape char is given

use std::cmp::Ordering;

use async_trait::async_trait;
use serde_json::Value as Json;
use tokio::sync::RwLock;
use tracing::trace;

use crate::criteria::{ColumnRef, CompareOp, JoinClause, JoinRelation, Predicate, Root, Source};
use crate::entity::Entity;
use crate::error::Result;
use crate::query::{Direction, QueryOptions, Sort};
use crate::repository::SpecificationExecutor;
use crate::specification::Specification;

const DEFAULT_LIKE_ESCAPE: char = '\\';

/// A specification realized once and evaluated against many records
#[derive(Debug, Clone)]
pub struct CompiledSpecification {
    predicate: Option<Predicate>,
    joins: Vec<JoinClause>,
}

impl CompiledSpecification {
    pub fn compile<T: Entity>(spec: &Specification<T>) -> Self {
        let root = Root::<T>::new();
        let predicate = spec.to_predicate(&root);
        Self {
            predicate,
            joins: root.joins(),
        }
    }

    /// Whether a serialized record satisfies the specification
    pub fn matches(&self, record: &Json) -> bool {
        let Some(predicate) = &self.predicate else {
            return true;
        };
        let mut bound = Vec::with_capacity(self.joins.len());
        any_binding(predicate, record, &self.joins, &mut bound)
    }
}

/// Whether a serialized record satisfies `spec`
pub fn matches<T: Entity>(spec: &Specification<T>, record: &Json) -> bool {
    CompiledSpecification::compile(spec).matches(record)
}

// Tries every combination of joined rows until one satisfies the predicate.
fn any_binding<'a>(
    predicate: &Predicate,
    record: &'a Json,
    joins: &[JoinClause],
    bound: &mut Vec<&'a Json>,
) -> bool {
    let Some(join) = joins.get(bound.len()) else {
        return eval(predicate, record, bound) == Some(true);
    };
    let Some(owner) = resolve(join.relation.owner(), record, bound) else {
        return false;
    };
    let related: &[Json] = match (&join.relation, owner.get(join.relation.property())) {
        (JoinRelation::Collection(_), Some(rows)) => {
            rows.as_array().map(Vec::as_slice).unwrap_or_default()
        }
        (JoinRelation::Reference(_), Some(row)) if !row.is_null() => std::slice::from_ref(row),
        _ => &[],
    };

    for row in related {
        bound.push(row);
        if any_binding(predicate, record, joins, bound) {
            return true;
        }
        bound.pop();
    }
    false
}

fn resolve<'a>(source: Source, record: &'a Json, bound: &[&'a Json]) -> Option<&'a Json> {
    match source {
        Source::Root => Some(record),
        Source::Join(index) => bound.get(index).copied(),
    }
}

fn column_value<'a>(column: &ColumnRef, record: &'a Json, bound: &[&'a Json]) -> Option<&'a Json> {
    let mut node = resolve(column.source, record, bound)?;
    // A missing or null embedded object reads as NULL columns
    for embedded in &column.embedded {
        node = node.get(embedded.property)?;
    }
    node.get(column.name).filter(|v| !v.is_null())
}

fn related_rows<'a>(
    owner: Source,
    property: &str,
    record: &'a Json,
    bound: &[&'a Json],
) -> Option<&'a [Json]> {
    let owner = resolve(owner, record, bound)?;
    Some(
        owner
            .get(property)
            .and_then(Json::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default(),
    )
}

/// Evaluate a predicate; `None` is SQL's unknown
fn eval(predicate: &Predicate, record: &Json, bound: &[&Json]) -> Option<bool> {
    match predicate {
        Predicate::Conjunction(terms) => {
            let mut result = Some(true);
            for term in terms {
                match eval(term, record, bound) {
                    Some(false) => return Some(false),
                    None => result = None,
                    Some(true) => {}
                }
            }
            result
        }
        Predicate::Disjunction(terms) => {
            let mut result = Some(false);
            for term in terms {
                match eval(term, record, bound) {
                    Some(true) => return Some(true),
                    None => result = None,
                    Some(false) => {}
                }
            }
            result
        }
        Predicate::Not(inner) => eval(inner, record, bound).map(|b| !b),
        Predicate::Compare { column, op, value } => {
            let field = column_value(column, record, bound)?;
            let ord = value.compare_json(field)?;
            Some(match op {
                CompareOp::Eq => ord == Ordering::Equal,
                CompareOp::Ne => ord != Ordering::Equal,
                CompareOp::Lt => ord == Ordering::Less,
                CompareOp::Le => ord != Ordering::Greater,
                CompareOp::Gt => ord == Ordering::Greater,
                CompareOp::Ge => ord != Ordering::Less,
            })
        }
        Predicate::Between { column, low, high } => {
            let field = column_value(column, record, bound)?;
            let above_low = low.compare_json(field)? != Ordering::Less;
            let below_high = high.compare_json(field)? != Ordering::Greater;
            Some(above_low && below_high)
        }
        Predicate::In { column, values } => {
            let field = column_value(column, record, bound)?;
            let mut unknown = false;
            for value in values {
                match value.matches_json(field) {
                    Some(true) => return Some(true),
                    None => unknown = true,
                    Some(false) => {}
                }
            }
            if unknown { None } else { Some(false) }
        }
        Predicate::IsNull { column, negated } => {
            let is_null = column_value(column, record, bound).is_none();
            Some(is_null != *negated)
        }
        Predicate::Boolean { column, value } => {
            let field = column_value(column, record, bound)?;
            field.as_bool().map(|b| b == *value)
        }
        Predicate::Like {
            column,
            pattern,
            escape,
            negated,
        } => {
            let text = column_value(column, record, bound)?.as_str()?;
            let matched = like_matches(text, pattern, escape.unwrap_or(DEFAULT_LIKE_ESCAPE))?;
            Some(matched != *negated)
        }
        Predicate::Empty {
            collection,
            negated,
        } => {
            let rows = related_rows(collection.owner, collection.property, record, bound)?;
            Some(rows.is_empty() != *negated)
        }
        Predicate::Member {
            collection,
            key,
            negated,
        } => {
            let rows = related_rows(collection.owner, collection.property, record, bound)?;
            let found = rows.iter().any(|row| {
                row.get(collection.target_key)
                    .and_then(|k| key.matches_json(k))
                    .unwrap_or(false)
            });
            Some(found != *negated)
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LikeToken {
    Literal(char),
    AnyChar,
    AnyRun,
}

// `None` when the pattern ends in a lone escape char, which PostgreSQL rejects
fn tokenize(pattern: &str, escape: char) -> Option<Vec<LikeToken>> {
    let mut tokens = Vec::new();
    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        let token = if c == escape {
            LikeToken::Literal(chars.next()?)
        } else if c == '%' {
            LikeToken::AnyRun
        } else if c == '_' {
            LikeToken::AnyChar
        } else {
            LikeToken::Literal(c)
        };
        tokens.push(token);
    }
    Some(tokens)
}

/// SQL LIKE matching: `%` matches any run of characters, `_` exactly one
///
/// A pattern ending in the escape char is invalid and yields `None`, so the
/// row is treated as unknown instead of matched.
pub fn like_matches(text: &str, pattern: &str, escape: char) -> Option<bool> {
    let tokens = tokenize(pattern, escape)?;
    let text: Vec<char> = text.chars().collect();

    // matched[j]: the text consumed so far matches tokens[..j]
    let mut matched = vec![false; tokens.len() + 1];
    matched[0] = true;
    for (j, token) in tokens.iter().enumerate() {
        matched[j + 1] = matched[j] && *token == LikeToken::AnyRun;
    }

    for c in &text {
        let mut next = vec![false; tokens.len() + 1];
        for (j, token) in tokens.iter().enumerate() {
            next[j + 1] = match token {
                LikeToken::AnyRun => next[j] || matched[j + 1],
                LikeToken::AnyChar => matched[j],
                LikeToken::Literal(l) => matched[j] && l == c,
            };
        }
        matched = next;
    }

    Some(matched[tokens.len()])
}

fn compare_present(a: &Json, b: &Json) -> Ordering {
    match (a, b) {
        (Json::Number(x), Json::Number(y)) => match (x.as_i64(), y.as_i64()) {
            (Some(x), Some(y)) => x.cmp(&y),
            _ => x
                .as_f64()
                .partial_cmp(&y.as_f64())
                .unwrap_or(Ordering::Equal),
        },
        (Json::String(x), Json::String(y)) => x.cmp(y),
        (Json::Bool(x), Json::Bool(y)) => x.cmp(y),
        _ => Ordering::Equal,
    }
}

fn compare_records(a: &Json, b: &Json, sort: &Sort) -> Ordering {
    for order in sort.orders() {
        let x = a.get(order.column).filter(|v| !v.is_null());
        let y = b.get(order.column).filter(|v| !v.is_null());
        // Nulls sort as larger than any value
        let ord = match (x, y) {
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Greater,
            (Some(_), None) => Ordering::Less,
            (Some(x), Some(y)) => compare_present(x, y),
        };
        let ord = match order.direction {
            Direction::Asc => ord,
            Direction::Desc => ord.reverse(),
        };
        if ord != Ordering::Equal {
            return ord;
        }
    }
    Ordering::Equal
}

/// Repository holding entities in memory
///
/// Executes specifications without a database, with the same matching rules
/// as [`PgRepository`](crate::repository::PgRepository).
#[derive(Debug)]
pub struct InMemoryRepository<T> {
    records: RwLock<Vec<T>>,
}

impl<T: Entity + Clone> Default for InMemoryRepository<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Entity + Clone> InMemoryRepository<T> {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(Vec::new()),
        }
    }

    /// Store an entity and hand it back
    pub async fn save(&self, entity: T) -> T {
        self.records.write().await.push(entity.clone());
        entity
    }

    pub async fn save_all(&self, entities: impl IntoIterator<Item = T>) {
        self.records.write().await.extend(entities);
    }

    pub async fn delete_all(&self) {
        self.records.write().await.clear();
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    async fn matching(&self, spec: &Specification<T>) -> Result<Vec<(Json, T)>> {
        let compiled = CompiledSpecification::compile(spec);
        let records = self.records.read().await;

        let mut matched = Vec::new();
        for entity in records.iter() {
            let record = serde_json::to_value(entity)?;
            if compiled.matches(&record) {
                matched.push((record, entity.clone()));
            }
        }
        trace!(
            table = T::TABLE,
            scanned = records.len(),
            matched = matched.len(),
            "Evaluated specification in memory"
        );
        Ok(matched)
    }
}

#[async_trait]
impl<T: Entity + Clone> SpecificationExecutor<T> for InMemoryRepository<T> {
    async fn find_all_with(
        &self,
        spec: &Specification<T>,
        options: &QueryOptions,
    ) -> Result<Vec<T>> {
        let mut matched = self.matching(spec).await?;
        if !options.sort.is_unsorted() {
            matched.sort_by(|(a, _), (b, _)| compare_records(a, b, &options.sort));
        }

        let entities = matched.into_iter().map(|(_, entity)| entity);
        Ok(match options.page {
            Some(page) => entities
                .skip(usize::try_from(page.offset).unwrap_or(0))
                .take(usize::try_from(page.limit).unwrap_or(0))
                .collect(),
            None => entities.collect(),
        })
    }

    async fn count(&self, spec: &Specification<T>) -> Result<i64> {
        let matched = self.matching(spec).await?;
        Ok(matched.len() as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{Collection, Embedded, Field, Reference};
    use crate::value::Value;
    use serde::Serialize;
    use serde_json::json;

    #[derive(Debug, Clone, Serialize)]
    struct Show {
        id: i32,
        name: String,
        release_date: Option<String>,
        ratings: Vec<Rating>,
    }

    #[derive(Debug, Clone, Serialize)]
    struct Rating {
        id: i32,
        stars: i32,
    }

    impl Entity for Show {
        const TABLE: &'static str = "show";
        fn id(&self) -> Value {
            self.id.into()
        }
    }

    impl Entity for Rating {
        const TABLE: &'static str = "rating";
        fn id(&self) -> Value {
            self.id.into()
        }
    }

    const NAME: Field<Show, String> = Field::new("name");
    const RELEASE_DATE: Field<Show, String> = Field::new("release_date");
    const RATINGS: Collection<Show, Rating> = Collection::new("ratings", "show_id");
    const STARS: Field<Rating, i32> = Field::new("stars");

    fn record(name: &str, release_date: Option<&str>, stars: &[i32]) -> Json {
        json!({
            "id": 1,
            "name": name,
            "release_date": release_date,
            "ratings": stars.iter().enumerate().map(|(i, s)| json!({"id": i, "stars": s})).collect::<Vec<_>>(),
        })
    }

    // ==================== LIKE ====================

    fn like(text: &str, pattern: &str, escape: char) -> bool {
        like_matches(text, pattern, escape) == Some(true)
    }

    #[test]
    fn test_like_wildcards() {
        assert!(like("The Walking Dead", "The%", '\\'));
        assert!(like("The Walking Dead", "%Walking%", '\\'));
        assert!(like("abc", "a_c", '\\'));
        assert!(!like("abbc", "a_c", '\\'));
        assert!(like("", "%", '\\'));
        assert!(!like("Hemlock Grove", "The%", '\\'));
    }

    #[test]
    fn test_like_escape() {
        assert!(like("among them?", "%them\\?", '\\'));
        assert!(like("100%", "100!%", '!'));
        assert!(!like("1000", "100!%", '!'));
        assert!(like("a_b", "a\\_b", '\\'));
        assert!(!like("axb", "a\\_b", '\\'));
    }

    #[test]
    fn test_like_trailing_escape_is_unknown() {
        assert_eq!(like_matches("a\\", "a\\", '\\'), None);
        assert_eq!(like_matches("50!", "50!", '!'), None);

        // Neither LIKE nor NOT LIKE selects the row
        let record = record("A\\", None, &[]);
        assert!(!matches(&NAME.like("A\\"), &record));
        assert!(!matches(&NAME.not_like("A\\"), &record));
    }

    // ==================== Three-valued logic ====================

    #[test]
    fn test_null_comparison_is_unknown_under_not() {
        let spec = !RELEASE_DATE.equal("2010");
        assert!(matches(&spec, &record("A", Some("2013"), &[])));
        assert!(!matches(&spec, &record("B", Some("2010"), &[])));
        assert!(!matches(&spec, &record("C", None, &[])));
    }

    #[test]
    fn test_unknown_or_true_is_true() {
        let spec = RELEASE_DATE.equal("2010") | NAME.equal("C");
        assert!(matches(&spec, &record("C", None, &[])));
    }

    #[test]
    fn test_unknown_and_false_is_false_under_not() {
        let spec = !(RELEASE_DATE.equal("2010") & NAME.equal("X"));
        assert!(matches(&spec, &record("C", None, &[])));
    }

    #[test]
    fn test_is_null_is_never_unknown() {
        assert!(matches(&RELEASE_DATE.is_null(), &record("C", None, &[])));
        assert!(!matches(&RELEASE_DATE.is_null(), &record("C", Some("2010"), &[])));
    }

    #[test]
    fn test_unrestricted_matches_everything() {
        assert!(matches(&Specification::<Show>::unrestricted(), &json!({})));
    }

    // ==================== Collections and joins ====================

    #[test]
    fn test_collection_emptiness_and_membership() {
        let rated = record("A", None, &[3, 4]);
        let unrated = record("B", None, &[]);

        assert!(matches(&RATINGS.is_empty(), &unrated));
        assert!(!matches(&RATINGS.is_empty(), &rated));
        assert!(matches(&RATINGS.is_not_empty(), &rated));

        let first = Rating { id: 0, stars: 3 };
        assert!(matches(&RATINGS.is_member(&first), &rated));
        assert!(!matches(&RATINGS.is_member(&first), &unrated));
        assert!(matches(&RATINGS.is_not_member(&first), &unrated));
    }

    #[test]
    fn test_join_is_existential() {
        let spec = Specification::<Show>::new(|root, cb| cb.equal(root.join(RATINGS).get(STARS), 2));
        assert!(matches(&spec, &record("A", None, &[4, 2])));
        assert!(!matches(&spec, &record("B", None, &[3, 4])));
    }

    #[test]
    fn test_join_with_no_rows_never_matches() {
        let spec = Specification::<Show>::new(|root, cb| {
            let ratings = root.join(RATINGS);
            cb.or(cb.is_null(ratings.get(STARS)), cb.is_not_null(ratings.get(STARS)))
        });
        assert!(!matches(&spec, &record("A", None, &[])));
        assert!(matches(&spec, &record("A", None, &[1])));
    }

    #[test]
    fn test_same_join_binds_one_row() {
        // Both comparisons must hold for the same rating row
        let spec = Specification::<Show>::new(|root, cb| {
            let ratings = root.join(RATINGS);
            cb.and(cb.gt(ratings.get(STARS), 2), cb.lt(ratings.get(STARS), 4))
        });
        assert!(!matches(&spec, &record("A", None, &[1, 5])));
        assert!(matches(&spec, &record("A", None, &[1, 3])));
    }

    // ==================== Embedded objects and references ====================

    #[derive(Debug, Clone, Serialize)]
    struct Network {
        id: i32,
        name: String,
    }

    impl Entity for Network {
        const TABLE: &'static str = "network";
        fn id(&self) -> Value {
            self.id.into()
        }
    }

    struct Schedule;

    const NETWORK: Reference<Show, Network> = Reference::new("network", "network_id");
    const NETWORK_NAME: Field<Network, String> = Field::new("name");
    const SCHEDULE: Embedded<Show, Schedule> = Embedded::new("schedule", "schedule_");
    const DAY: Field<Schedule, String> = Field::new("day");

    #[test]
    fn test_embedded_attribute_reads_nested_object() {
        let spec =
            Specification::<Show>::new(|root, cb| cb.equal(root.embedded(SCHEDULE).get(DAY), "Sunday"));
        assert!(matches(&spec, &json!({"schedule": {"day": "Sunday"}})));
        assert!(!matches(&spec, &json!({"schedule": {"day": "Monday"}})));

        let missing =
            Specification::<Show>::new(|root, cb| cb.is_null(root.embedded(SCHEDULE).get(DAY)));
        assert!(matches(&missing, &json!({"schedule": null})));
        assert!(matches(&missing, &json!({})));
        assert!(!matches(&spec, &json!({"schedule": null})));
    }

    #[test]
    fn test_reference_join_binds_single_record() {
        let spec = Specification::<Show>::new(|root, cb| {
            cb.equal(root.join(NETWORK).get(NETWORK_NAME), "AMC")
        });
        assert!(matches(&spec, &json!({"network": {"id": 2, "name": "AMC"}})));
        assert!(!matches(&spec, &json!({"network": {"id": 1, "name": "Netflix"}})));

        // Inner join: no referenced record, no match even under negation
        let negated = Specification::<Show>::new(|root, cb| {
            cb.not(cb.equal(root.join(NETWORK).get(NETWORK_NAME), "AMC"))
        });
        assert!(!matches(&negated, &json!({"network": null})));
        assert!(matches(&negated, &json!({"network": {"id": 1, "name": "Netflix"}})));
    }

    // ==================== Repository ====================

    fn show(id: i32, name: &str, release_date: Option<&str>) -> Show {
        Show {
            id,
            name: name.to_string(),
            release_date: release_date.map(str::to_string),
            ratings: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_repository_sort_and_page() {
        let repo = InMemoryRepository::new();
        repo.save_all([
            show(1, "Hemlock Grove", Some("2013")),
            show(2, "The Walking Dead", Some("2010")),
            show(3, "Better Call Saul", None),
        ])
        .await;

        let options = QueryOptions::new().with_sort(Sort::by(NAME));
        let names: Vec<String> = repo
            .find_all_with(&Specification::unrestricted(), &options)
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.name)
            .collect();
        assert_eq!(names, ["Better Call Saul", "Hemlock Grove", "The Walking Dead"]);

        let options = QueryOptions::new()
            .with_sort(Sort::by(RELEASE_DATE))
            .with_page(crate::query::PageRequest::new(1, 5));
        let ids: Vec<i32> = repo
            .find_all_with(&Specification::unrestricted(), &options)
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.id)
            .collect();
        // 2010, 2013, then the null release date last
        assert_eq!(ids, [1, 3]);
    }

    #[tokio::test]
    async fn test_repository_find_one_and_count() {
        let repo = InMemoryRepository::new();
        repo.save(show(1, "Hemlock Grove", Some("2013"))).await;
        repo.save(show(2, "The Walking Dead", Some("2010"))).await;

        let found = repo.find_one(&NAME.equal("Hemlock Grove")).await.unwrap();
        assert_eq!(found.map(|s| s.id), Some(1));
        assert!(repo.find_one(&NAME.equal("Nope")).await.unwrap().is_none());
        assert!(repo.find_one(&Specification::unrestricted()).await.is_err());

        assert_eq!(repo.count(&RELEASE_DATE.is_not_null()).await.unwrap(), 2);
        assert!(repo.exists(&NAME.like("The%")).await.unwrap());

        repo.delete_all().await;
        assert!(repo.is_empty().await);
    }
}
