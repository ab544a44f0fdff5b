//! Condition building for SQL WHERE clauses
//!
//! Converts a realized [`Predicate`] into a PostgreSQL condition with
//! positional parameters.

use crate::criteria::{CollectionRef, ColumnRef, Predicate, Source};
use crate::query::Sort;
use crate::sql::sanitize::quote_identifier;
use crate::value::Value;

/// Alias of the query root in generated SQL
pub const ROOT_ALIAS: &str = "t0";

/// Alias of correlated collection subqueries
const SUBQUERY_ALIAS: &str = "m";

/// SQL alias for a predicate source
pub fn source_alias(source: Source) -> String {
    match source {
        Source::Root => ROOT_ALIAS.to_string(),
        Source::Join(index) => format!("j{}", index + 1),
    }
}

/// Quoted, optionally schema-qualified table name
pub fn qualified_table(schema: Option<&str>, table: &str) -> String {
    match schema {
        Some(schema) => format!("{}.{}", quote_identifier(schema), quote_identifier(table)),
        None => quote_identifier(table),
    }
}

fn column_sql(column: &ColumnRef) -> String {
    format!(
        "{}.{}",
        source_alias(column.source),
        quote_identifier(&column.column_name())
    )
}

fn push_param(params: &mut Vec<Value>, value: &Value, param_offset: &mut i32) -> String {
    params.push(value.clone());
    let placeholder = format!("${}", param_offset);
    *param_offset += 1;
    placeholder
}

/// Build SQL WHERE clause from a Predicate
///
/// Returns (clause, params) tuple where:
/// - `clause` is the SQL WHERE condition string with parameter placeholders ($1, $2, etc.)
/// - `params` is a vector of parameter values to bind, in placeholder order
///
/// # Arguments
/// * `predicate` - The predicate to convert
/// * `schema` - Optional schema used to qualify tables in collection subqueries
/// * `param_offset` - Starting parameter number (mutated to track next available)
pub fn build_condition_clause(
    predicate: &Predicate,
    schema: Option<&str>,
    param_offset: &mut i32,
) -> (String, Vec<Value>) {
    let mut params = Vec::new();
    let clause = render(predicate, schema, param_offset, &mut params);
    (clause, params)
}

fn render(
    predicate: &Predicate,
    schema: Option<&str>,
    param_offset: &mut i32,
    params: &mut Vec<Value>,
) -> String {
    match predicate {
        Predicate::Conjunction(terms) => {
            render_junction(terms, " AND ", "TRUE", schema, param_offset, params)
        }
        Predicate::Disjunction(terms) => {
            render_junction(terms, " OR ", "FALSE", schema, param_offset, params)
        }
        Predicate::Not(inner) => {
            format!("NOT ({})", render(inner, schema, param_offset, params))
        }
        Predicate::Compare { column, op, value } => {
            let placeholder = push_param(params, value, param_offset);
            format!("{} {} {}", column_sql(column), op.as_sql(), placeholder)
        }
        Predicate::Between { column, low, high } => {
            let low = push_param(params, low, param_offset);
            let high = push_param(params, high, param_offset);
            format!("{} BETWEEN {} AND {}", column_sql(column), low, high)
        }
        Predicate::In { column, values } => {
            if values.is_empty() {
                return "FALSE".to_string();
            }
            let placeholders: Vec<String> = values
                .iter()
                .map(|v| push_param(params, v, param_offset))
                .collect();
            format!("{} IN ({})", column_sql(column), placeholders.join(", "))
        }
        Predicate::IsNull { column, negated } => {
            let op = if *negated { "IS NOT NULL" } else { "IS NULL" };
            format!("{} {}", column_sql(column), op)
        }
        Predicate::Boolean { column, value } => {
            let literal = if *value { "TRUE" } else { "FALSE" };
            format!("{} = {}", column_sql(column), literal)
        }
        Predicate::Like {
            column,
            pattern,
            escape,
            negated,
        } => {
            let placeholder = push_param(params, &Value::Text(pattern.clone()), param_offset);
            let op = if *negated { "NOT LIKE" } else { "LIKE" };
            let mut clause = format!("{} {} {}", column_sql(column), op, placeholder);
            if let Some(escape) = escape {
                let escape = escape.to_string().replace('\'', "''");
                clause.push_str(&format!(" ESCAPE '{}'", escape));
            }
            clause
        }
        Predicate::Empty {
            collection,
            negated,
        } => {
            // "not empty" is the existence of a related row
            let exists = if *negated { "EXISTS" } else { "NOT EXISTS" };
            format!("{} ({})", exists, collection_subquery(collection, schema))
        }
        Predicate::Member {
            collection,
            key,
            negated,
        } => {
            let exists = if *negated { "NOT EXISTS" } else { "EXISTS" };
            let placeholder = push_param(params, key, param_offset);
            format!(
                "{} ({} AND {}.{} = {})",
                exists,
                collection_subquery(collection, schema),
                SUBQUERY_ALIAS,
                quote_identifier(collection.target_key),
                placeholder
            )
        }
    }
}

fn render_junction(
    terms: &[Predicate],
    separator: &str,
    identity: &str,
    schema: Option<&str>,
    param_offset: &mut i32,
    params: &mut Vec<Value>,
) -> String {
    if terms.is_empty() {
        return identity.to_string();
    }
    let clauses: Vec<String> = terms
        .iter()
        .map(|term| format!("({})", render(term, schema, param_offset, params)))
        .collect();
    clauses.join(separator)
}

fn collection_subquery(collection: &CollectionRef, schema: Option<&str>) -> String {
    format!(
        "SELECT 1 FROM {} {} WHERE {}.{} = {}.{}",
        qualified_table(schema, collection.table),
        SUBQUERY_ALIAS,
        SUBQUERY_ALIAS,
        quote_identifier(collection.foreign_key),
        source_alias(collection.owner),
        quote_identifier(collection.owner_key)
    )
}

/// Build ORDER BY clause from a Sort
///
/// Returns `None` for an unsorted request, otherwise the clause without the
/// "ORDER BY" prefix.
pub fn build_order_by_clause(sort: &Sort) -> Option<String> {
    if sort.is_unsorted() {
        return None;
    }
    let parts: Vec<String> = sort
        .orders()
        .iter()
        .map(|order| {
            format!(
                "{}.{} {}",
                ROOT_ALIAS,
                quote_identifier(order.column),
                order.direction.as_sql()
            )
        })
        .collect();
    Some(parts.join(", "))
}
