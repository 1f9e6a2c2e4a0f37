//! Pure query primitives: the filter builder, sort parsing and
//! pagination arithmetic.
//!
//! Everything here is independent of the storage dialect. Column paths
//! come exclusively from the static per-resource rule tables below;
//! request-supplied values travel as data inside [`Filter`] and are
//! rendered as bind parameters by the database layer, never spliced
//! into query text.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::{LyceumError, LyceumResult};

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_PER_PAGE: u32 = 2;
pub const MAX_PER_PAGE: u32 = 10;

/// Request query parameters, as handed over by the transport layer.
///
/// Ordered so that filter construction is deterministic.
#[derive(Debug, Clone, Default)]
pub struct QueryParams(BTreeMap<String, String>);

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for QueryParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

/// How a recognized parameter matches against its column(s).
#[derive(Debug, Clone, Copy)]
pub enum FilterRule {
    /// Equality on a single column.
    Exact {
        param: &'static str,
        column: &'static str,
    },
    /// Case-insensitive substring match; several columns are OR-ed.
    Contains {
        param: &'static str,
        columns: &'static [&'static str],
    },
    /// Two-ended inclusive range; applied only when both bounds are
    /// present.
    Range {
        lower: &'static str,
        upper: &'static str,
        column: &'static str,
    },
}

/// A predicate description produced by [`build_filters`]. Values are
/// untrusted request data and must be bound, not interpolated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Filter {
    Eq {
        column: &'static str,
        value: String,
    },
    ContainsCi {
        columns: &'static [&'static str],
        value: String,
    },
    Between {
        column: &'static str,
        lower: String,
        upper: String,
    },
}

/// Translate recognized request parameters into predicate descriptions.
///
/// Unrecognized parameters are silently ignored; an empty result means
/// the unfiltered set. Rules are applied in table order.
pub fn build_filters(rules: &[FilterRule], params: &QueryParams) -> Vec<Filter> {
    let mut filters = Vec::new();
    for rule in rules {
        match *rule {
            FilterRule::Exact { param, column } => {
                if let Some(value) = params.get(param) {
                    filters.push(Filter::Eq {
                        column,
                        value: value.to_owned(),
                    });
                }
            }
            FilterRule::Contains { param, columns } => {
                if let Some(value) = params.get(param) {
                    filters.push(Filter::ContainsCi {
                        columns,
                        value: value.to_owned(),
                    });
                }
            }
            FilterRule::Range {
                lower,
                upper,
                column,
            } => {
                if let (Some(lo), Some(hi)) = (params.get(lower), params.get(upper)) {
                    filters.push(Filter::Between {
                        column,
                        lower: lo.to_owned(),
                        upper: hi.to_owned(),
                    });
                }
            }
        }
    }
    filters
}

/// A single ordering term parsed from the `sort` parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortClause {
    pub column: &'static str,
    pub descending: bool,
}

/// Parse the comma-separated `sort` parameter against a per-resource
/// allow-list of `(field, column)` pairs. A `-` prefix selects
/// descending order. Unknown fields fail with `InvalidOrderColumn`.
pub fn parse_sort(
    params: &QueryParams,
    allowed: &[(&'static str, &'static str)],
) -> LyceumResult<Vec<SortClause>> {
    let Some(sort) = params.get("sort") else {
        return Ok(Vec::new());
    };

    let mut clauses = Vec::new();
    for name in sort.split(',').filter(|s| !s.is_empty()) {
        let descending = name.starts_with('-');
        let field = name.trim_start_matches('-');
        match allowed.iter().find(|(f, _)| *f == field) {
            Some(&(_, column)) => clauses.push(SortClause { column, descending }),
            None => return Err(LyceumError::InvalidOrderColumn(field.to_owned())),
        }
    }
    Ok(clauses)
}

/// Page window requested by the caller. Oversized `per_page` values are
/// clamped, not rejected.
#[derive(Debug, Clone, Copy)]
pub struct PageRequest {
    pub page: u32,
    pub per_page: u32,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            per_page: DEFAULT_PER_PAGE,
        }
    }
}

impl PageRequest {
    pub fn new(page: u32, per_page: u32) -> Self {
        Self {
            page: page.max(1),
            per_page: per_page.clamp(1, MAX_PER_PAGE),
        }
    }

    /// Read `page` and `per_page` from the request, falling back to the
    /// defaults on absent or non-numeric values.
    pub fn from_params(params: &QueryParams) -> Self {
        let page = params
            .get("page")
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_PAGE);
        let per_page = params
            .get("per_page")
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_PER_PAGE);
        Self::new(page, per_page)
    }

    /// Number of rows to skip.
    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.per_page)
    }
}

/// One page of results plus navigation metadata.
#[derive(Debug, Clone, Serialize)]
pub struct PageResult<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u32,
    pub pages: u32,
    pub per_page: u32,
    pub prev_num: Option<u32>,
    pub next_num: Option<u32>,
}

impl<T> PageResult<T> {
    /// Assemble a page. Fails with `EmptyPage` when the window holds no
    /// items — an out-of-range page number and a legitimately empty
    /// result are deliberately indistinguishable.
    pub fn new(items: Vec<T>, total: u64, request: &PageRequest) -> LyceumResult<Self> {
        if items.is_empty() {
            return Err(LyceumError::EmptyPage);
        }
        let per_page = request.per_page;
        let pages = total.div_ceil(u64::from(per_page)) as u32;
        let page = request.page;
        Ok(Self {
            items,
            total,
            page,
            pages,
            per_page,
            prev_num: (page > 1).then(|| page - 1),
            next_num: (page < pages).then(|| page + 1),
        })
    }

    /// Convert the items, keeping the page metadata.
    pub fn try_map<U, F>(self, f: F) -> LyceumResult<PageResult<U>>
    where
        F: FnMut(T) -> LyceumResult<U>,
    {
        let items = self.items.into_iter().map(f).collect::<LyceumResult<_>>()?;
        Ok(PageResult {
            items,
            total: self.total,
            page: self.page,
            pages: self.pages,
            per_page: self.per_page,
            prev_num: self.prev_num,
            next_num: self.next_num,
        })
    }
}

// ---------------------------------------------------------------------
// Per-resource rule tables
// ---------------------------------------------------------------------
//
// Filter columns address the stored row (record-link paths included);
// sort columns address the projected result set.

pub const INSTITUTE_FILTERS: &[FilterRule] = &[
    FilterRule::Contains {
        param: "trading_name",
        columns: &["trading_name"],
    },
    FilterRule::Contains {
        param: "corporate_name",
        columns: &["corporate_name"],
    },
    FilterRule::Contains {
        param: "state",
        columns: &["address.state"],
    },
    FilterRule::Contains {
        param: "city",
        columns: &["address.city"],
    },
    FilterRule::Contains {
        param: "cnpj",
        columns: &["cnpj"],
    },
];

pub const INSTITUTE_SORTABLE: &[(&str, &str)] = &[
    ("trading_name", "trading_name"),
    ("corporate_name", "corporate_name"),
    ("cnpj", "cnpj"),
];

pub const STUDENT_FILTERS: &[FilterRule] = &[
    FilterRule::Contains {
        param: "name",
        columns: &["user.name"],
    },
    FilterRule::Contains {
        param: "state",
        columns: &["address.state"],
    },
    FilterRule::Contains {
        param: "city",
        columns: &["address.city"],
    },
    FilterRule::Exact {
        param: "gender",
        column: "gender",
    },
    FilterRule::Range {
        lower: "date_lower",
        upper: "date_upper",
        column: "birthday_date",
    },
];

pub const STUDENT_SORTABLE: &[(&str, &str)] = &[
    ("name", "name"),
    ("birthday_date", "birthday_date"),
    ("gender", "gender"),
];

/// Employee listings page over users; `search` spans name and email.
pub const USER_FILTERS: &[FilterRule] = &[
    FilterRule::Contains {
        param: "search",
        columns: &["user.name", "user.email"],
    },
    FilterRule::Exact {
        param: "profile",
        column: "user.profile",
    },
];

pub const USER_SORTABLE: &[(&str, &str)] = &[("name", "name"), ("email", "email")];

pub const DOCUMENT_FILTERS: &[FilterRule] = &[FilterRule::Contains {
    param: "title",
    columns: &["title"],
}];

pub const DOCUMENT_SORTABLE: &[(&str, &str)] = &[("title", "title")];
