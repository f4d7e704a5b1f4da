//! Rendering of shaped query specifications onto `sqlx::QueryBuilder`.
//!
//! Column names come exclusively from the per-collection field maps and the
//! route-fixed scopes, so pushing them verbatim is safe; every caller value
//! goes through `push_bind`. Data and count queries share the same writer so
//! their predicates cannot drift apart.

use sqlx::{Postgres, QueryBuilder};

use crate::domain::shared::pagination::PageWindow;
use crate::domain::shared::query::{
    Comparison, FilterClause, FilterValue, SortDirection, SortKey,
};

/// Appends WHERE/AND-separated predicates to a query under construction.
pub struct PredicateWriter {
    started: bool,
}

impl PredicateWriter {
    pub fn new() -> Self {
        Self { started: false }
    }

    fn sep(&mut self, qb: &mut QueryBuilder<'_, Postgres>) {
        qb.push(if self.started { " AND " } else { " WHERE " });
        self.started = true;
    }

    pub fn clauses(&mut self, qb: &mut QueryBuilder<'_, Postgres>, clauses: &[FilterClause]) {
        for clause in clauses {
            self.sep(qb);
            qb.push(clause.column);
            if clause.op == Comparison::In {
                qb.push(" = ANY(");
                bind_value(qb, &clause.value);
                qb.push(")");
            } else {
                qb.push(op_sql(clause.op));
                bind_value(qb, &clause.value);
            }
        }
    }

    /// Full-text predicate against a tsvector column.
    pub fn text_match(&mut self, qb: &mut QueryBuilder<'_, Postgres>, column: &str, term: &str) {
        self.sep(qb);
        qb.push(column)
            .push(" @@ plainto_tsquery('english', ")
            .push_bind(term.to_string())
            .push(")");
    }
}

fn op_sql(op: Comparison) -> &'static str {
    match op {
        Comparison::Eq | Comparison::In => " = ",
        Comparison::Gt => " > ",
        Comparison::Gte => " >= ",
        Comparison::Lt => " < ",
        Comparison::Lte => " <= ",
    }
}

fn bind_value(qb: &mut QueryBuilder<'_, Postgres>, value: &FilterValue) {
    match value {
        FilterValue::Text(s) => {
            qb.push_bind(s.clone());
        }
        FilterValue::Integer(i) => {
            qb.push_bind(*i);
        }
        FilterValue::Uuid(u) => {
            qb.push_bind(*u);
        }
        FilterValue::Timestamp(t) => {
            qb.push_bind(*t);
        }
        FilterValue::UuidSet(ids) => {
            qb.push_bind(ids.clone());
        }
    }
}

/// `ORDER BY` from the parsed sort keys, falling back to the collection's
/// default clause when none were requested.
pub fn push_order(qb: &mut QueryBuilder<'_, Postgres>, order: &[SortKey], default_clause: &str) {
    if order.is_empty() {
        qb.push(default_clause);
        return;
    }
    qb.push(" ORDER BY ");
    for (i, key) in order.iter().enumerate() {
        if i > 0 {
            qb.push(", ");
        }
        qb.push(key.column);
        qb.push(match key.direction {
            SortDirection::Asc => " ASC",
            SortDirection::Desc => " DESC",
        });
    }
}

pub fn push_window(qb: &mut QueryBuilder<'_, Postgres>, window: PageWindow) {
    qb.push(" LIMIT ")
        .push_bind(window.limit)
        .push(" OFFSET ")
        .push_bind(window.skip);
}
