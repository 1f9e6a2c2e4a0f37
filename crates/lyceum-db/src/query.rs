//! Rendering of predicate/ordering descriptions into parameterized
//! SurrealQL, and the paginated query executor.
//!
//! Query text is assembled only from static fragments: table names,
//! projections and column paths all come from code. Request-supplied
//! values travel exclusively through `.bind(...)`.

use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;

use lyceum_core::error::LyceumResult;
use lyceum_core::query::{Filter, PageRequest, PageResult, SortClause};

use crate::error::DbError;

/// Static scoping fragment with its bind — the tenant restriction or
/// link-membership constraint a repository applies before any
/// request-supplied filter.
pub(crate) struct Scope {
    pub fragment: &'static str,
    pub bind_name: &'static str,
    pub bind_value: String,
}

#[derive(Debug, SurrealValue)]
struct CountRow {
    total: u64,
}

fn render_where(scope: Option<&Scope>, filters: &[Filter]) -> (String, Vec<(String, String)>) {
    let mut clauses = Vec::new();
    let mut binds = Vec::new();

    if let Some(scope) = scope {
        clauses.push(scope.fragment.to_owned());
        binds.push((scope.bind_name.to_owned(), scope.bind_value.clone()));
    }

    for (i, filter) in filters.iter().enumerate() {
        match filter {
            Filter::Eq { column, value } => {
                let name = format!("f{i}");
                clauses.push(format!("{column} = ${name}"));
                binds.push((name, value.clone()));
            }
            Filter::ContainsCi { columns, value } => {
                let name = format!("f{i}");
                let alternatives = columns
                    .iter()
                    .map(|column| {
                        format!(
                            "string::contains(string::lowercase({column}), \
                             string::lowercase(${name}))"
                        )
                    })
                    .collect::<Vec<_>>()
                    .join(" OR ");
                clauses.push(format!("({alternatives})"));
                binds.push((name, value.clone()));
            }
            Filter::Between {
                column,
                lower,
                upper,
            } => {
                let lo = format!("f{i}_lo");
                let hi = format!("f{i}_hi");
                clauses.push(format!("({column} >= ${lo} AND {column} <= ${hi})"));
                binds.push((lo, lower.clone()));
                binds.push((hi, upper.clone()));
            }
        }
    }

    if clauses.is_empty() {
        (String::new(), binds)
    } else {
        (format!(" WHERE {}", clauses.join(" AND ")), binds)
    }
}

fn render_order(sort: &[SortClause]) -> String {
    if sort.is_empty() {
        return " ORDER BY created_at ASC".to_owned();
    }
    let terms = sort
        .iter()
        .map(|clause| {
            let direction = if clause.descending { "DESC" } else { "ASC" };
            format!("{} {}", clause.column, direction)
        })
        .collect::<Vec<_>>()
        .join(", ");
    format!(" ORDER BY {terms}")
}

/// Execute a paginated query: one `count()` round trip for the total,
/// one windowed select for the page. Fails with `EmptyPage` when the
/// resulting window holds no rows.
pub(crate) async fn fetch_page<C: Connection, Row: SurrealValue>(
    db: &Surreal<C>,
    table: &'static str,
    projection: &str,
    scope: Option<Scope>,
    filters: &[Filter],
    sort: &[SortClause],
    page: PageRequest,
) -> LyceumResult<PageResult<Row>> {
    let (where_sql, binds) = render_where(scope.as_ref(), filters);

    let mut count_query = db.query(format!(
        "SELECT count() AS total FROM {table}{where_sql} GROUP ALL"
    ));
    for (name, value) in &binds {
        count_query = count_query.bind((name.clone(), value.clone()));
    }
    let mut count_result = count_query.await.map_err(DbError::from)?;
    let count_rows: Vec<CountRow> = count_result.take(0).map_err(DbError::from)?;
    let total = count_rows.first().map(|r| r.total).unwrap_or(0);

    let order_sql = render_order(sort);
    let mut query = db
        .query(format!(
            "SELECT {projection} FROM {table}{where_sql}{order_sql} \
             LIMIT $limit START $start"
        ))
        .bind(("limit", u64::from(page.per_page)))
        .bind(("start", page.offset()));
    for (name, value) in binds {
        query = query.bind((name, value));
    }
    let mut result = query.await.map_err(DbError::from)?;
    let rows: Vec<Row> = result.take(0).map_err(DbError::from)?;

    PageResult::new(rows, total, &page)
}
