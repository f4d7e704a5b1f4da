//! Query shaping for list endpoints.
//!
//! Every list endpoint accepts the same parameter surface: `page`, `limit`,
//! `sort`, `search`, plus arbitrary pass-through filter fields. This module
//! turns those parameters into a [`ShapedQuery`] (scope + predicate + order +
//! window) through a fixed stage order, and exposes the [`ResidualFilter`]
//! (search and filter stages, pre-pagination) so that a separate count runs
//! against a predicate equivalent to the shaped query's.
//!
//! Filter pass-through only recognizes fields declared in a per-collection
//! [`FieldMap`]; unrecognized fields are dropped. A value that cannot be
//! parsed for its field's type is a builder fault and propagates.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer};
use uuid::Uuid;

use super::errors::DomainError;
use super::pagination::PageWindow;

/// Parameter keys consumed by the pagination, sort, and search stages.
/// The filter stage never passes these through as predicates.
pub const RESERVED_KEYS: [&str; 4] = ["page", "limit", "sort", "search"];

/// Raw listing parameters, deserializable from either a query string or a
/// JSON body. `page`/`limit` accept numbers or numeric strings; anything
/// else resolves to absent rather than failing the request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListingParams {
    #[serde(default, deserialize_with = "lenient_number")]
    pub page: Option<i64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub limit: Option<i64>,
    #[serde(default)]
    pub sort: Option<String>,
    #[serde(default)]
    pub search: Option<String>,
    /// Everything else: candidate filter fields.
    #[serde(flatten)]
    pub filters: BTreeMap<String, serde_json::Value>,
}

impl ListingParams {
    /// The search term, if one was meaningfully supplied.
    pub fn search_term(&self) -> Option<&str> {
        self.search.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }
}

fn lenient_number<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| match v {
        serde_json::Value::Number(n) => n.as_i64(),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }))
}

/// Value type of a filterable field, used to parse raw parameter values
/// before they reach the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Integer,
    Uuid,
    Timestamp,
}

/// One externally filterable/sortable field and the column it maps to.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub column: &'static str,
    pub kind: FieldKind,
}

/// Per-collection whitelist of fields that may appear in `sort` or as
/// filter parameters. Doubles as the name-to-column mapping, so nothing
/// caller-supplied is ever interpolated into SQL.
#[derive(Debug, Clone, Copy)]
pub struct FieldMap(pub &'static [FieldSpec]);

impl FieldMap {
    pub fn get(&self, name: &str) -> Option<&FieldSpec> {
        self.0.iter().find(|f| f.name == name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Eq,
    Gt,
    Gte,
    Lt,
    Lte,
    In,
}

impl Comparison {
    fn from_op(op: &str) -> Option<Self> {
        match op {
            "gt" => Some(Self::Gt),
            "gte" => Some(Self::Gte),
            "lt" => Some(Self::Lt),
            "lte" => Some(Self::Lte),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    Text(String),
    Integer(i64),
    Uuid(Uuid),
    Timestamp(DateTime<Utc>),
    UuidSet(Vec<Uuid>),
}

/// A single predicate: column, comparison, bound value.
#[derive(Debug, Clone, PartialEq)]
pub struct FilterClause {
    pub column: &'static str,
    pub op: Comparison,
    pub value: FilterValue,
}

impl FilterClause {
    pub fn eq(column: &'static str, value: FilterValue) -> Self {
        Self {
            column,
            op: Comparison::Eq,
            value,
        }
    }

    pub fn within(column: &'static str, ids: Vec<Uuid>) -> Self {
        Self {
            column,
            op: Comparison::In,
            value: FilterValue::UuidSet(ids),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SortKey {
    pub column: &'static str,
    pub direction: SortDirection,
}

/// The fully shaped, not-yet-executed query specification. Owned by a single
/// listing invocation; never shared across requests.
#[derive(Debug, Clone)]
pub struct ShapedQuery {
    /// Base predicate fixed by the route (e.g. "blogs of this user").
    pub scope: Vec<FilterClause>,
    /// Pass-through filter predicates from the request.
    pub filters: Vec<FilterClause>,
    pub search: Option<String>,
    pub order: Vec<SortKey>,
    pub window: PageWindow,
}

/// The shaped query's predicate without pagination, for the count query.
#[derive(Debug, Clone)]
pub struct ResidualFilter {
    pub scope: Vec<FilterClause>,
    pub filters: Vec<FilterClause>,
    pub search: Option<String>,
}

/// Stage-ordered builder over a [`ShapedQuery`].
///
/// Stages run in a fixed order: pagination, search, sort, filter. Each stage
/// is a no-op when the corresponding parameter is absent. Only the filter
/// stage can fail (malformed value for a recognized field).
pub struct QueryFeatures<'a> {
    params: &'a ListingParams,
    fields: &'static FieldMap,
    shaped: ShapedQuery,
}

impl<'a> QueryFeatures<'a> {
    pub fn new(
        scope: Vec<FilterClause>,
        params: &'a ListingParams,
        fields: &'static FieldMap,
    ) -> Self {
        Self {
            params,
            fields,
            shaped: ShapedQuery {
                scope,
                filters: Vec::new(),
                search: None,
                order: Vec::new(),
                window: PageWindow::default(),
            },
        }
    }

    pub fn paginate(mut self) -> Self {
        self.shaped.window = PageWindow::resolve(self.params.page, self.params.limit);
        self
    }

    pub fn search(mut self) -> Self {
        self.shaped.search = self.params.search_term().map(ToOwned::to_owned);
        self
    }

    /// Comma/space-delimited field list, leading `-` meaning descending.
    /// Unrecognized fields are dropped; an empty result leaves the
    /// collection's default order in force.
    pub fn sort(mut self) -> Self {
        let Some(spec) = self.params.sort.as_deref() else {
            return self;
        };
        for token in spec.split([',', ' ']).map(str::trim).filter(|t| !t.is_empty()) {
            let (name, direction) = match token.strip_prefix('-') {
                Some(rest) => (rest, SortDirection::Desc),
                None => (token, SortDirection::Asc),
            };
            match self.fields.get(name) {
                Some(field) => self.shaped.order.push(SortKey {
                    column: field.column,
                    direction,
                }),
                None => tracing::debug!(field = name, "ignoring unknown sort field"),
            }
        }
        self
    }

    /// Copy recognized request fields into the predicate. Supports range
    /// comparisons both as bracketed keys (`createdAt[gte]=...`) and as
    /// comparison objects (`{"createdAt": {"gte": ...}}`).
    pub fn filter(mut self) -> Result<Self, DomainError> {
        for (raw_key, raw_value) in &self.params.filters {
            let (name, bracket_op) = split_filter_key(raw_key)?;
            if RESERVED_KEYS.contains(&name) {
                continue;
            }
            let Some(field) = self.fields.get(name) else {
                tracing::debug!(field = name, "ignoring unknown filter field");
                continue;
            };
            match (bracket_op, raw_value) {
                (None, serde_json::Value::Object(ops)) => {
                    for (op_name, op_value) in ops {
                        let op = Comparison::from_op(op_name).ok_or_else(|| {
                            DomainError::ValidationError(format!(
                                "unsupported comparison `{op_name}` for filter field `{name}`"
                            ))
                        })?;
                        self.shaped.filters.push(FilterClause {
                            column: field.column,
                            op,
                            value: parse_filter_value(field, op_value)?,
                        });
                    }
                }
                (op, value) => {
                    self.shaped.filters.push(FilterClause {
                        column: field.column,
                        op: op.unwrap_or(Comparison::Eq),
                        value: parse_filter_value(field, value)?,
                    });
                }
            }
        }
        Ok(self)
    }

    pub fn into_parts(self) -> (ShapedQuery, ResidualFilter) {
        let residual = ResidualFilter {
            scope: self.shaped.scope.clone(),
            filters: self.shaped.filters.clone(),
            search: self.shaped.search.clone(),
        };
        (self.shaped, residual)
    }
}

/// Split `field[op]` keys into the field name and the comparison.
fn split_filter_key(raw: &str) -> Result<(&str, Option<Comparison>), DomainError> {
    let Some(open) = raw.find('[') else {
        return Ok((raw, None));
    };
    let Some(op_name) = raw[open + 1..].strip_suffix(']') else {
        return Err(DomainError::ValidationError(format!(
            "malformed filter key `{raw}`"
        )));
    };
    let op = Comparison::from_op(op_name).ok_or_else(|| {
        DomainError::ValidationError(format!(
            "unsupported comparison `{op_name}` in filter key `{raw}`"
        ))
    })?;
    Ok((&raw[..open], Some(op)))
}

fn parse_filter_value(
    field: &FieldSpec,
    raw: &serde_json::Value,
) -> Result<FilterValue, DomainError> {
    let malformed = || {
        DomainError::ValidationError(format!(
            "invalid value for filter field `{}`: {raw}",
            field.name
        ))
    };
    match field.kind {
        FieldKind::Text => match raw {
            serde_json::Value::String(s) => Ok(FilterValue::Text(s.clone())),
            serde_json::Value::Number(n) => Ok(FilterValue::Text(n.to_string())),
            _ => Err(malformed()),
        },
        FieldKind::Integer => match raw {
            serde_json::Value::Number(n) => n.as_i64().map(FilterValue::Integer).ok_or_else(malformed),
            serde_json::Value::String(s) => {
                s.trim().parse().map(FilterValue::Integer).map_err(|_| malformed())
            }
            _ => Err(malformed()),
        },
        FieldKind::Uuid => match raw {
            serde_json::Value::String(s) => {
                Uuid::parse_str(s.trim()).map(FilterValue::Uuid).map_err(|_| malformed())
            }
            _ => Err(malformed()),
        },
        FieldKind::Timestamp => match raw {
            serde_json::Value::String(s) => parse_timestamp(s.trim()).ok_or_else(malformed),
            _ => Err(malformed()),
        },
    }
}

fn parse_timestamp(raw: &str) -> Option<FilterValue> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(FilterValue::Timestamp(ts.with_timezone(&Utc)));
    }
    let date = raw.parse::<NaiveDate>().ok()?;
    Some(FilterValue::Timestamp(DateTime::from_naive_utc_and_offset(
        date.and_hms_opt(0, 0, 0)?,
        Utc,
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    static FIELDS: FieldMap = FieldMap(&[
        FieldSpec {
            name: "title",
            column: "b.title",
            kind: FieldKind::Text,
        },
        FieldSpec {
            name: "user",
            column: "b.user_id",
            kind: FieldKind::Uuid,
        },
        FieldSpec {
            name: "createdAt",
            column: "b.created_at",
            kind: FieldKind::Timestamp,
        },
    ]);

    fn params_with(entries: &[(&str, serde_json::Value)]) -> ListingParams {
        ListingParams {
            filters: entries
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
            ..Default::default()
        }
    }

    #[test]
    fn sort_parses_direction_per_field() {
        let params = ListingParams {
            sort: Some("-createdAt,title".into()),
            ..Default::default()
        };
        let (shaped, _) = QueryFeatures::new(Vec::new(), &params, &FIELDS)
            .paginate()
            .search()
            .sort()
            .filter()
            .unwrap()
            .into_parts();
        assert_eq!(
            shaped.order,
            vec![
                SortKey {
                    column: "b.created_at",
                    direction: SortDirection::Desc
                },
                SortKey {
                    column: "b.title",
                    direction: SortDirection::Asc
                },
            ]
        );
    }

    #[test]
    fn sort_drops_unknown_fields() {
        let params = ListingParams {
            sort: Some("bogus,-title".into()),
            ..Default::default()
        };
        let (shaped, _) = QueryFeatures::new(Vec::new(), &params, &FIELDS)
            .sort()
            .filter()
            .unwrap()
            .into_parts();
        assert_eq!(shaped.order.len(), 1);
        assert_eq!(shaped.order[0].column, "b.title");
    }

    #[test]
    fn filter_passes_recognized_fields_only() {
        let params = params_with(&[
            ("title", serde_json::json!("hello")),
            ("mystery", serde_json::json!("ignored")),
        ]);
        let (shaped, _) = QueryFeatures::new(Vec::new(), &params, &FIELDS)
            .filter()
            .unwrap()
            .into_parts();
        assert_eq!(shaped.filters.len(), 1);
        assert_eq!(
            shaped.filters[0],
            FilterClause::eq("b.title", FilterValue::Text("hello".into()))
        );
    }

    #[test]
    fn filter_supports_bracketed_range_operators() {
        let params = params_with(&[("createdAt[gte]", serde_json::json!("2024-01-01"))]);
        let (shaped, _) = QueryFeatures::new(Vec::new(), &params, &FIELDS)
            .filter()
            .unwrap()
            .into_parts();
        assert_eq!(shaped.filters.len(), 1);
        assert_eq!(shaped.filters[0].op, Comparison::Gte);
        assert_eq!(shaped.filters[0].column, "b.created_at");
    }

    #[test]
    fn filter_supports_comparison_objects() {
        let params = params_with(&[(
            "createdAt",
            serde_json::json!({"gte": "2024-01-01", "lt": "2024-02-01"}),
        )]);
        let (shaped, _) = QueryFeatures::new(Vec::new(), &params, &FIELDS)
            .filter()
            .unwrap()
            .into_parts();
        let ops: Vec<Comparison> = shaped.filters.iter().map(|c| c.op).collect();
        assert!(ops.contains(&Comparison::Gte));
        assert!(ops.contains(&Comparison::Lt));
    }

    #[test]
    fn filter_rejects_malformed_values() {
        let params = params_with(&[("user", serde_json::json!("not-a-uuid"))]);
        let err = QueryFeatures::new(Vec::new(), &params, &FIELDS)
            .filter()
            .err()
            .expect("malformed uuid must fail the build");
        assert!(matches!(err, DomainError::ValidationError(_)));
    }

    #[test]
    fn filter_rejects_unknown_comparison() {
        let params = params_with(&[("createdAt[within]", serde_json::json!("2024-01-01"))]);
        assert!(
            QueryFeatures::new(Vec::new(), &params, &FIELDS)
                .filter()
                .is_err()
        );
    }

    #[test]
    fn reserved_keys_never_become_predicates() {
        // Simulates params assembled by hand (e.g. from a JSON body map).
        let params = params_with(&[("search", serde_json::json!("term"))]);
        let (shaped, _) = QueryFeatures::new(Vec::new(), &params, &FIELDS)
            .filter()
            .unwrap()
            .into_parts();
        assert!(shaped.filters.is_empty());
    }

    #[test]
    fn residual_matches_shaped_predicate() {
        let params = ListingParams {
            page: Some(3),
            limit: Some(5),
            search: Some("mountains".into()),
            ..params_with(&[("title", serde_json::json!("x"))])
        };
        let (shaped, residual) = QueryFeatures::new(Vec::new(), &params, &FIELDS)
            .paginate()
            .search()
            .sort()
            .filter()
            .unwrap()
            .into_parts();
        assert_eq!(residual.filters, shaped.filters);
        assert_eq!(residual.search, shaped.search);
        assert_eq!(shaped.window.skip, 10);
    }

    #[test]
    fn lenient_params_accept_numeric_strings() {
        let params: ListingParams =
            serde_json::from_value(serde_json::json!({"page": "2", "limit": 7})).unwrap();
        assert_eq!(params.page, Some(2));
        assert_eq!(params.limit, Some(7));
    }

    #[test]
    fn lenient_params_drop_garbage_numbers() {
        let params: ListingParams =
            serde_json::from_value(serde_json::json!({"page": "two", "limit": [1]})).unwrap();
        assert_eq!(params.page, None);
        assert_eq!(params.limit, None);
    }
}
