//! SELECT statement generation for specifications
//!
//! Realizes a specification against a fresh root and wraps the resulting
//! condition in a complete statement. Joins navigated by the specification
//! become `INNER JOIN`s, and the root row is de-duplicated with `DISTINCT`
//! whenever a join is present.

use crate::criteria::{JoinClause, Root, Source};
use crate::entity::Entity;
use crate::query::QueryOptions;
use crate::specification::Specification;
use crate::sql::condition::{
    ROOT_ALIAS, build_condition_clause, build_order_by_clause, qualified_table, source_alias,
};
use crate::sql::sanitize::quote_identifier;
use crate::value::Value;

/// A statement together with the parameters to bind, in placeholder order
#[derive(Debug, Clone, PartialEq)]
pub struct SqlQuery {
    pub sql: String,
    pub params: Vec<Value>,
}

struct FromWhere {
    from: String,
    condition: Option<String>,
    params: Vec<Value>,
    joined: bool,
}

impl FromWhere {
    fn where_sql(&self) -> String {
        match &self.condition {
            Some(condition) => format!(" WHERE {}", condition),
            None => String::new(),
        }
    }
}

fn join_sql(join: &JoinClause, schema: Option<&str>) -> String {
    let alias = source_alias(Source::Join(join.index));
    let relation = &join.relation;
    let (joined_column, owner_column) = relation.join_columns();
    format!(
        " INNER JOIN {} {} ON {}.{} = {}.{}",
        qualified_table(schema, relation.table()),
        alias,
        alias,
        quote_identifier(joined_column),
        source_alias(relation.owner()),
        quote_identifier(owner_column)
    )
}

fn from_where<T: Entity>(
    spec: &Specification<T>,
    schema: Option<&str>,
    param_offset: &mut i32,
) -> FromWhere {
    let root = Root::<T>::new();
    let predicate = spec.to_predicate(&root);
    // Joins are only known once the predicate has been realized
    let joins = root.joins();

    let mut from = format!("{} {}", qualified_table(schema, T::TABLE), ROOT_ALIAS);
    for join in &joins {
        from.push_str(&join_sql(join, schema));
    }

    let (condition, params) = match predicate {
        Some(predicate) => {
            let (clause, params) = build_condition_clause(&predicate, schema, param_offset);
            (Some(clause), params)
        }
        None => (None, Vec::new()),
    };

    FromWhere {
        from,
        condition,
        params,
        joined: !joins.is_empty(),
    }
}

/// `SELECT` of root rows matching `spec`, with ordering and paging
pub fn build_select<T: Entity>(
    spec: &Specification<T>,
    options: &QueryOptions,
    schema: Option<&str>,
) -> SqlQuery {
    let mut param_offset = 1;
    let parts = from_where(spec, schema, &mut param_offset);

    let distinct = if parts.joined { "DISTINCT " } else { "" };
    let mut sql = format!(
        "SELECT {}{}.* FROM {}{}",
        distinct,
        ROOT_ALIAS,
        parts.from,
        parts.where_sql()
    );
    let mut params = parts.params;

    if let Some(order_by) = build_order_by_clause(&options.sort) {
        sql.push_str(&format!(" ORDER BY {}", order_by));
    }

    if let Some(page) = options.page {
        sql.push_str(&format!(
            " LIMIT ${} OFFSET ${}",
            param_offset,
            param_offset + 1
        ));
        params.push(Value::Int(page.limit));
        params.push(Value::Int(page.offset));
    }

    SqlQuery { sql, params }
}

/// `SELECT COUNT` of root rows matching `spec`
pub fn build_count<T: Entity>(spec: &Specification<T>, schema: Option<&str>) -> SqlQuery {
    let mut param_offset = 1;
    let parts = from_where(spec, schema, &mut param_offset);

    let counted = if parts.joined {
        format!(
            "COUNT(DISTINCT {}.{})",
            ROOT_ALIAS,
            quote_identifier(T::PRIMARY_KEY)
        )
    } else {
        "COUNT(*)".to_string()
    };

    SqlQuery {
        sql: format!("SELECT {} FROM {}{}", counted, parts.from, parts.where_sql()),
        params: parts.params,
    }
}

/// `SELECT EXISTS` over root rows matching `spec`
pub fn build_exists<T: Entity>(spec: &Specification<T>, schema: Option<&str>) -> SqlQuery {
    let mut param_offset = 1;
    let parts = from_where(spec, schema, &mut param_offset);

    SqlQuery {
        sql: format!(
            "SELECT EXISTS (SELECT 1 FROM {}{})",
            parts.from,
            parts.where_sql()
        ),
        params: parts.params,
    }
}
