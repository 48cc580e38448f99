//! Query assembly for message listings

use crate::filter::{Predicate, PredicateValue, Scalar};
use crate::visibility::{push_scope, Scope};
use noticeboard_types::{Column, SortDirection, TenantId};
use sqlx::{QueryBuilder, Sqlite};

/// Columns selected for every message read, against the `m` alias
pub(crate) const MESSAGE_COLUMNS: &str = "m.message_id, m.sender_ids, m.title, m.content, \
     m.category, m.big_content, m.introducer_ids, m.status, m.created_at, m.updated_at";

/// Ordering for a listing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Sort {
    pub column: Column,
    pub direction: SortDirection,
}

/// A validated listing request
///
/// Built from already compiled predicates, so nothing in here can carry raw
/// query text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListQuery {
    pub predicates: Vec<Predicate>,
    pub sort: Sort,
    pub page: i64,
}

impl ListQuery {
    pub fn new(predicates: Vec<Predicate>, sort: Sort, page: i64) -> Self {
        Self {
            predicates,
            sort,
            page,
        }
    }

    /// 1-based page, with zero and negative pages treated as the first
    pub fn page(&self) -> i64 {
        self.page.max(1)
    }

    pub fn offset(&self, page_size: i64) -> i64 {
        (self.page() - 1).saturating_mul(page_size)
    }
}

/// Build the listing query for `tenant`
///
/// Shape: live rows, AND the visibility scope, AND each predicate, ordered by
/// the sort column with the row id as tie-break, then LIMIT/OFFSET.
pub fn assemble<'a>(
    tenant: &TenantId,
    query: &ListQuery,
    page_size: i64,
) -> QueryBuilder<'a, Sqlite> {
    let mut qb = QueryBuilder::new("SELECT ");
    qb.push(MESSAGE_COLUMNS)
        .push(" FROM messages m WHERE m.deleted_at IS NULL AND ");
    push_scope(&mut qb, "m", Scope::Visible(tenant));

    for predicate in &query.predicates {
        qb.push(" AND ");
        push_predicate(&mut qb, predicate);
    }

    let direction = query.sort.direction.as_sql();
    qb.push(" ORDER BY m.")
        .push(query.sort.column.as_sql())
        .push(" ")
        .push(direction)
        .push(", m.id ")
        .push(direction)
        .push(" LIMIT ")
        .push_bind(page_size)
        .push(" OFFSET ")
        .push_bind(query.offset(page_size));

    qb
}

fn push_predicate(qb: &mut QueryBuilder<'_, Sqlite>, predicate: &Predicate) {
    qb.push("m.")
        .push(predicate.column.as_sql())
        .push(" ")
        .push(predicate.comparator.as_sql())
        .push(" ");

    match &predicate.value {
        PredicateValue::One(scalar) => push_scalar(qb, scalar),
        PredicateValue::Set(scalars) => {
            qb.push("(");
            for (i, scalar) in scalars.iter().enumerate() {
                if i > 0 {
                    qb.push(", ");
                }
                push_scalar(qb, scalar);
            }
            qb.push(")");
        }
    }
}

fn push_scalar(qb: &mut QueryBuilder<'_, Sqlite>, scalar: &Scalar) {
    match scalar {
        Scalar::Text(text) => qb.push_bind(text.clone()),
        Scalar::Integer(n) => qb.push_bind(*n),
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::compile;

    fn tenant() -> TenantId {
        TenantId::new("alice").unwrap()
    }

    #[test]
    fn test_defaults() {
        let sql = assemble(&tenant(), &ListQuery::default(), 20).sql().to_string();
        assert!(sql.contains("m.deleted_at IS NULL"));
        assert!(sql.contains("ORDER BY m.created_at DESC, m.id DESC"));
        assert!(sql.ends_with("LIMIT ? OFFSET ?"));
    }

    #[test]
    fn test_predicates_are_anded_after_visibility() {
        let predicates = compile("status in 0|1, title like %plan%").unwrap();
        let query = ListQuery::new(
            predicates,
            Sort {
                column: Column::Title,
                direction: SortDirection::Asc,
            },
            2,
        );
        let sql = assemble(&tenant(), &query, 10).sql().to_string();
        assert!(sql.contains(") AND m.status IN (?, ?) AND m.title LIKE ?"));
        assert!(sql.contains("ORDER BY m.title ASC, m.id ASC"));
        assert!(!sql.contains("plan"));
        assert!(!sql.contains(" OR m."));
    }

    #[test]
    fn test_page_floor_and_offset() {
        let mut query = ListQuery::default();
        assert_eq!(query.page(), 1);
        assert_eq!(query.offset(20), 0);
        query.page = -3;
        assert_eq!(query.offset(20), 0);
        query.page = 3;
        assert_eq!(query.offset(20), 40);
    }
}
