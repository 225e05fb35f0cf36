//! Translation of HTTP query strings into store queries.
//!
//! [`QueryTranslator`] turns the `(key, value)` pairs of a listing request into a
//! [`QueryCriteria`]: a filter expression, projection, sort keys and a pagination window.
//!
//! # Reserved keys
//!
//! | Key      | Meaning                                                        |
//! |----------|----------------------------------------------------------------|
//! | `limit`  | page size, defaults to 10                                      |
//! | `skip`   | offset, defaults to 0                                          |
//! | `sort`   | comma-separated fields, `-field` for descending                |
//! | `fields` | comma-separated projection, `-field` to exclude instead        |
//!
//! # Filters
//!
//! Every other key is a predicate on the document field of the same name:
//!
//! | Query string            | Predicate                               |
//! |-------------------------|-----------------------------------------|
//! | `category=fantasy`      | `category == "fantasy"`                 |
//! | `category=horror,fantasy` | `category` is any of the listed values |
//! | `price>=10`             | `price >= 10` (parsed as key `price>`)  |
//! | `price<=10`             | `price <= 10`                           |
//! | `category!=horror`      | `category != "horror"`                  |
//! | `price[gt]=10`          | bracket form of any operator            |
//! | `img`                   | field exists                            |
//! | `!img`                  | field does not exist                    |
//!
//! Bracket operators are `eq`, `ne`, `gt`, `gte`, `lt`, `lte`, `in`, `nin`, `contains`,
//! `starts`, `ends` and `exists`. A key whose suffix is not one of these is kept verbatim as a
//! literal equality field; it is not validated.
//!
//! Values are coerced: `true`/`false` become booleans, `null` becomes null, plain integers
//! and decimals become numbers (unless they carry a leading zero), hyphenated UUIDs become
//! UUIDs, and a value wrapped in double quotes is always the literal string inside them.

use std::{collections::HashSet, str::FromStr};

use bson::{Bson, Uuid};
use url::form_urlencoded;

use crate::{
    error::{DocumentStoreError, DocumentStoreResult},
    page::PageLinks,
    query::{Expr, FieldOp, Projection, Query, Sort, SortDirection},
};

/// Page size used when a request does not specify `limit`.
pub const DEFAULT_LIMIT: usize = 10;

const LIMIT_KEY: &str = "limit";
const SKIP_KEY: &str = "skip";
const SORT_KEY: &str = "sort";
const FIELDS_KEY: &str = "fields";

/// What to do with a filter on a field outside the translator's allow-list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnknownFieldPolicy {
    /// Pass the filter through to the store unchanged.
    Allow,
    /// Drop the filter.
    #[default]
    Ignore,
    /// Fail the translation with [`DocumentStoreError::InvalidQuery`].
    Reject,
}

impl FromStr for UnknownFieldPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "allow" => Ok(Self::Allow),
            "ignore" => Ok(Self::Ignore),
            "reject" => Ok(Self::Reject),
            other => Err(format!("unknown filter policy '{other}' (expected allow, ignore or reject)")),
        }
    }
}

/// Converts query-string pairs into [`QueryCriteria`].
///
/// Without an allow-list every non-reserved key is a filter. With one, keys naming other
/// fields are handled by the configured [`UnknownFieldPolicy`]. Field paths with a segment
/// starting with `$` are never forwarded to the store.
///
/// # Example
///
/// ```ignore
/// use bookshelf::querystring::{QueryTranslator, UnknownFieldPolicy};
///
/// let translator = QueryTranslator::new()
///     .with_allowed_fields(["title", "price", "category"])
///     .with_unknown_fields(UnknownFieldPolicy::Reject)
///     .with_max_limit(100);
///
/// let criteria = translator.translate([("category", "fantasy"), ("sort", "-price")])?;
/// ```
#[derive(Debug, Clone)]
pub struct QueryTranslator {
    allowed_fields: Option<HashSet<String>>,
    unknown_fields: UnknownFieldPolicy,
    default_limit: usize,
    max_limit: Option<usize>,
}

impl Default for QueryTranslator {
    fn default() -> Self {
        Self::new()
    }
}

impl QueryTranslator {
    /// Creates a permissive translator: no allow-list, default page size of [`DEFAULT_LIMIT`]
    /// and no page size cap.
    pub fn new() -> Self {
        Self {
            allowed_fields: None,
            unknown_fields: UnknownFieldPolicy::default(),
            default_limit: DEFAULT_LIMIT,
            max_limit: None,
        }
    }

    /// Restricts filters to the given fields. A dotted path is allowed when its first
    /// segment is.
    pub fn with_allowed_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_fields = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    /// Sets the policy for filters outside the allow-list.
    pub fn with_unknown_fields(mut self, policy: UnknownFieldPolicy) -> Self {
        self.unknown_fields = policy;
        self
    }

    /// Sets the page size used when `limit` is absent or unusable.
    pub fn with_default_limit(mut self, limit: usize) -> Self {
        self.default_limit = limit.max(1);
        self
    }

    /// Caps the page size a caller may request.
    pub fn with_max_limit(mut self, limit: usize) -> Self {
        self.max_limit = Some(limit.max(1));
        self
    }

    /// Translates query-string pairs into criteria.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::InvalidQuery`] only under
    /// [`UnknownFieldPolicy::Reject`], when a filter names a field outside the allow-list or
    /// an operator-like field.
    pub fn translate<I, K, V>(&self, params: I) -> DocumentStoreResult<QueryCriteria>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut criteria = QueryCriteria {
            filter: None,
            projection: None,
            sort: Vec::new(),
            skip: 0,
            limit: self.default_limit,
            params: Vec::new(),
        };
        let mut predicates = Vec::new();

        for (key, value) in params {
            let (key, value) = (key.as_ref().trim(), value.as_ref().trim());

            match key {
                LIMIT_KEY => criteria.limit = self.parse_limit(value),
                SKIP_KEY => criteria.skip = value.parse::<usize>().unwrap_or(0),
                SORT_KEY => {
                    criteria.sort = parse_sort(value);
                    criteria.params.push((key.to_string(), value.to_string()));
                }
                FIELDS_KEY => {
                    criteria.projection = parse_projection(value);
                    criteria.params.push((key.to_string(), value.to_string()));
                }
                "" => {}
                _ => {
                    let predicate = parse_predicate(key, value);

                    if self.admits(predicate_field(&predicate))? {
                        predicates.push(predicate);
                        criteria.params.push((key.to_string(), value.to_string()));
                    }
                }
            }
        }

        criteria.filter = match predicates.len() {
            0 => None,
            1 => predicates.pop(),
            _ => Some(Expr::And(predicates)),
        };

        Ok(criteria)
    }

    fn parse_limit(&self, value: &str) -> usize {
        let limit = match value.parse::<usize>() {
            Ok(0) | Err(_) => self.default_limit,
            Ok(limit) => limit,
        };

        match self.max_limit {
            Some(max) => limit.min(max),
            None => limit,
        }
    }

    fn admits(&self, field: &str) -> DocumentStoreResult<bool> {
        let operator_like = field.split('.').any(|segment| segment.starts_with('$'));
        let known = !operator_like
            && self.allowed_fields.as_ref().is_none_or(|allowed| {
                allowed.contains(field)
                    || field
                        .split('.')
                        .next()
                        .is_some_and(|root| allowed.contains(root))
            });

        if known {
            return Ok(true);
        }

        match self.unknown_fields {
            UnknownFieldPolicy::Allow if !operator_like => Ok(true),
            UnknownFieldPolicy::Reject => Err(DocumentStoreError::InvalidQuery(format!(
                "filtering on '{field}' is not allowed"
            ))),
            _ => {
                tracing::debug!(field, "ignoring filter on unrecognized field");
                Ok(false)
            }
        }
    }
}

/// The result of translating a query string.
///
/// Holds everything needed to run the count and the windowed fetch of a listing with the
/// same filter, and to produce navigation links afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryCriteria {
    /// Conjunction of all filter predicates, if any.
    pub filter: Option<Expr>,
    /// Requested projection, if any.
    pub projection: Option<Projection>,
    /// Sort keys, most significant first.
    pub sort: Vec<Sort>,
    /// Offset of the window.
    pub skip: usize,
    /// Size of the window, always at least 1.
    pub limit: usize,
    params: Vec<(String, String)>,
}

impl QueryCriteria {
    /// Builds the windowed store query.
    pub fn to_query(&self) -> Query {
        Query {
            filter: self.filter.clone(),
            projection: self.projection.clone(),
            sort: self.sort.clone(),
            limit: Some(self.limit),
            offset: Some(self.skip),
        }
    }

    /// Number of pages of `limit` items needed to cover `total` items.
    pub fn total_pages(&self, total: usize) -> usize {
        total.div_ceil(self.limit)
    }

    /// Builds navigation links for a listing of `total` items served at `base_url`.
    ///
    /// Links repeat the original filter, sort and projection parameters and substitute
    /// `skip` and `limit`. `previous` and `first` exist only when `skip > 0`; `next` and
    /// `last` only when `skip + limit < total`.
    pub fn links(&self, base_url: &str, total: usize) -> PageLinks {
        let mut links = PageLinks::default();

        if self.skip > 0 {
            links.previous = Some(self.link(base_url, self.skip.saturating_sub(self.limit)));
            links.first = Some(self.link(base_url, 0));
        }

        let next = self.skip.saturating_add(self.limit);
        if next < total {
            links.next = Some(self.link(base_url, next));
            links.last = Some(self.link(base_url, ((total - 1) / self.limit) * self.limit));
        }

        links
    }

    fn link(&self, base_url: &str, skip: usize) -> String {
        let query = form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.params.iter())
            .append_pair(SKIP_KEY, &skip.to_string())
            .append_pair(LIMIT_KEY, &self.limit.to_string())
            .finish();
        let separator = if base_url.contains('?') { '&' } else { '?' };

        format!("{base_url}{separator}{query}")
    }
}

fn predicate_field(expr: &Expr) -> &str {
    match expr {
        Expr::Field { field, .. } | Expr::Exists(field, _) => field,
        _ => "",
    }
}

fn parse_predicate(key: &str, value: &str) -> Expr {
    if value.is_empty() {
        return match key.strip_prefix('!') {
            Some(field) if !field.is_empty() => Expr::Exists(field.to_string(), false),
            _ => Expr::Exists(key.to_string(), true),
        };
    }

    match split_operator(key) {
        Some((field, "exists")) => {
            Expr::Exists(field.to_string(), !matches!(value, "false" | "0"))
        }
        Some((field, op)) => match bracket_op(op) {
            Some(FieldOp::AnyOf) => Expr::field(field.to_string(), FieldOp::AnyOf, coerce_list(value)),
            Some(FieldOp::NoneOf) => Expr::field(field.to_string(), FieldOp::NoneOf, coerce_list(value)),
            Some(FieldOp::Eq) => equality(field, value, false),
            Some(FieldOp::Ne) => equality(field, value, true),
            Some(op) => Expr::field(field.to_string(), op, coerce(value)),
            None => equality(key, value, false),
        },
        None => equality(key, value, false),
    }
}

fn equality(field: &str, value: &str, negated: bool) -> Expr {
    let list = !is_quoted(value) && value.contains(',');

    let (op, value) = match (list, negated) {
        (true, false) => (FieldOp::AnyOf, coerce_list(value)),
        (true, true) => (FieldOp::NoneOf, coerce_list(value)),
        (false, false) => (FieldOp::Eq, coerce(value)),
        (false, true) => (FieldOp::Ne, coerce(value)),
    };

    Expr::field(field.to_string(), op, value)
}

/// Splits `price[gte]` into `("price", "gte")` and the symbol forms left behind by
/// `price>=10`, `price<=10` and `price!=10` into `("price", "gte" | "lte" | "ne")`.
fn split_operator(key: &str) -> Option<(&str, &str)> {
    if let Some(head) = key.strip_suffix(']') {
        let (field, op) = head.split_once('[')?;

        let known = op == "exists" || bracket_op(op).is_some();

        return (known && !field.is_empty()).then_some((field, op));
    }

    let (field, op) = match key.chars().last()? {
        '>' => (&key[..key.len() - 1], "gte"),
        '<' => (&key[..key.len() - 1], "lte"),
        '!' => (&key[..key.len() - 1], "ne"),
        _ => return None,
    };

    (!field.is_empty()).then_some((field, op))
}

fn bracket_op(op: &str) -> Option<FieldOp> {
    Some(match op {
        "eq" => FieldOp::Eq,
        "ne" => FieldOp::Ne,
        "gt" => FieldOp::Gt,
        "gte" => FieldOp::Gte,
        "lt" => FieldOp::Lt,
        "lte" => FieldOp::Lte,
        "in" => FieldOp::AnyOf,
        "nin" => FieldOp::NoneOf,
        "contains" => FieldOp::Contains,
        "starts" => FieldOp::StartsWith,
        "ends" => FieldOp::EndsWith,
        _ => return None,
    })
}

fn parse_sort(value: &str) -> Vec<Sort> {
    value
        .split(',')
        .map(str::trim)
        .filter_map(|token| {
            let (direction, field) = match token.as_bytes().first()? {
                b'-' => (SortDirection::Desc, &token[1..]),
                b'+' => (SortDirection::Asc, &token[1..]),
                _ => (SortDirection::Asc, token),
            };

            (!field.is_empty() && !field.starts_with('$'))
                .then(|| Sort { field: field.to_string(), direction })
        })
        .collect()
}

fn parse_projection(value: &str) -> Option<Projection> {
    let (mut include, mut exclude) = (Vec::new(), Vec::new());

    for token in value.split(',').map(str::trim) {
        match token.strip_prefix('-') {
            Some(field) if !field.is_empty() && !field.starts_with('$') => {
                exclude.push(field.to_string())
            }
            None if !token.is_empty() && !token.starts_with('$') => {
                include.push(token.trim_start_matches('+').to_string())
            }
            _ => {}
        }
    }

    // Inclusion wins when both forms are mixed, as in MongoDB projections.
    if !include.is_empty() {
        Some(Projection::Include(include))
    } else if !exclude.is_empty() {
        Some(Projection::Exclude(exclude))
    } else {
        None
    }
}

fn is_quoted(value: &str) -> bool {
    value.len() >= 2 && value.starts_with('"') && value.ends_with('"')
}

fn coerce_list(value: &str) -> Bson {
    Bson::Array(
        value
            .split(',')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(coerce)
            .collect(),
    )
}

fn coerce(value: &str) -> Bson {
    if is_quoted(value) {
        return Bson::String(value[1..value.len() - 1].to_string());
    }

    match value {
        "true" => return Bson::Boolean(true),
        "false" => return Bson::Boolean(false),
        "null" => return Bson::Null,
        _ => {}
    }

    if is_numeric(value) {
        if let Ok(int) = value.parse::<i64>() {
            return Bson::Int64(int);
        }
        if let Ok(float) = value.parse::<f64>() {
            return Bson::Double(float);
        }
    }

    if let Ok(uuid) = Uuid::parse_str(value) {
        return Bson::from(uuid);
    }

    Bson::String(value.to_string())
}

/// Plain decimal notation only, and no leading zeros: `0553283685` is an identifier,
/// not a number.
fn is_numeric(value: &str) -> bool {
    let digits = value.strip_prefix('-').unwrap_or(value);
    let (whole, fraction) = match digits.split_once('.') {
        Some((whole, fraction)) => (whole, Some(fraction)),
        None => (digits, None),
    };

    !whole.is_empty()
        && whole.bytes().all(|b| b.is_ascii_digit())
        && (whole == "0" || !whole.starts_with('0'))
        && fraction.is_none_or(|f| !f.is_empty() && f.bytes().all(|b| b.is_ascii_digit()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn translate(params: &[(&str, &str)]) -> QueryCriteria {
        QueryTranslator::new()
            .with_unknown_fields(UnknownFieldPolicy::Allow)
            .translate(params.iter().copied())
            .unwrap()
    }

    #[test]
    fn test_defaults_without_reserved_keys() {
        let criteria = translate(&[]);

        assert_eq!(criteria.limit, DEFAULT_LIMIT);
        assert_eq!(criteria.skip, 0);
        assert!(criteria.filter.is_none());
        assert!(criteria.projection.is_none());
        assert!(criteria.sort.is_empty());
    }

    #[test]
    fn test_plain_keys_become_equality_filters() {
        let criteria = translate(&[("category", "fantasy"), ("price", "12")]);

        assert_eq!(
            criteria.filter,
            Some(Expr::And(vec![
                Expr::field("category".into(), FieldOp::Eq, Bson::String("fantasy".into())),
                Expr::field("price".into(), FieldOp::Eq, Bson::Int64(12)),
            ]))
        );
    }

    #[test]
    fn test_symbol_and_bracket_operators() {
        let criteria = translate(&[
            ("price>", "10"),
            ("price<", "20.5"),
            ("category!", "horror"),
            ("title[starts]", "Du"),
            ("price[gt]", "1"),
        ]);

        let Some(Expr::And(predicates)) = criteria.filter else {
            panic!("expected a conjunction");
        };

        assert_eq!(predicates, vec![
            Expr::field("price".into(), FieldOp::Gte, Bson::Int64(10)),
            Expr::field("price".into(), FieldOp::Lte, Bson::Double(20.5)),
            Expr::field("category".into(), FieldOp::Ne, Bson::String("horror".into())),
            Expr::field("title".into(), FieldOp::StartsWith, Bson::String("Du".into())),
            Expr::field("price".into(), FieldOp::Gt, Bson::Int64(1)),
        ]);
    }

    #[test]
    fn test_comma_lists_become_membership() {
        let criteria = translate(&[("category", "horror,fantasy")]);
        assert_eq!(
            criteria.filter,
            Some(Expr::field(
                "category".into(),
                FieldOp::AnyOf,
                Bson::Array(vec!["horror".into(), "fantasy".into()]),
            ))
        );

        let criteria = translate(&[("category!", "horror,fantasy")]);
        assert!(matches!(
            criteria.filter,
            Some(Expr::Field { op: FieldOp::NoneOf, .. })
        ));
    }

    #[test]
    fn test_malformed_suffix_is_literal_equality() {
        let criteria = translate(&[("price[between]", "1")]);

        assert_eq!(
            criteria.filter,
            Some(Expr::field("price[between]".into(), FieldOp::Eq, Bson::Int64(1)))
        );
    }

    #[test]
    fn test_empty_values_test_existence() {
        let criteria = translate(&[("img", ""), ("!asin", "")]);

        assert_eq!(
            criteria.filter,
            Some(Expr::And(vec![
                Expr::Exists("img".into(), true),
                Expr::Exists("asin".into(), false),
            ]))
        );
    }

    #[test]
    fn test_value_coercion() {
        let id = Uuid::new();

        assert_eq!(coerce("true"), Bson::Boolean(true));
        assert_eq!(coerce("null"), Bson::Null);
        assert_eq!(coerce("-3"), Bson::Int64(-3));
        assert_eq!(coerce("9.99"), Bson::Double(9.99));
        assert_eq!(coerce("0553283685"), Bson::String("0553283685".into()));
        assert_eq!(coerce("\"42\""), Bson::String("42".into()));
        assert_eq!(coerce("1e5"), Bson::String("1e5".into()));
        assert_eq!(coerce("inf"), Bson::String("inf".into()));
        assert_eq!(coerce(&id.to_string()), Bson::from(id));
    }

    #[test]
    fn test_reserved_keys() {
        let criteria = translate(&[
            ("limit", "5"),
            ("skip", "15"),
            ("sort", "-price,title"),
            ("fields", "title,price"),
        ]);

        assert_eq!(criteria.limit, 5);
        assert_eq!(criteria.skip, 15);
        assert_eq!(criteria.sort, vec![
            Sort { field: "price".into(), direction: SortDirection::Desc },
            Sort { field: "title".into(), direction: SortDirection::Asc },
        ]);
        assert_eq!(
            criteria.projection,
            Some(Projection::Include(vec!["title".into(), "price".into()]))
        );
        assert!(criteria.filter.is_none());
    }

    #[test]
    fn test_exclusion_projection() {
        let criteria = translate(&[("fields", "-img,-asin")]);

        assert_eq!(
            criteria.projection,
            Some(Projection::Exclude(vec!["img".into(), "asin".into()]))
        );
    }

    #[test]
    fn test_unusable_limits_fall_back_and_clamp() {
        let translator = QueryTranslator::new().with_max_limit(50);

        for raw in ["0", "-4", "abc"] {
            let criteria = translator.translate([("limit", raw)]).unwrap();
            assert_eq!(criteria.limit, DEFAULT_LIMIT, "limit={raw}");
        }

        let criteria = translator.translate([("limit", "500"), ("skip", "x")]).unwrap();
        assert_eq!(criteria.limit, 50);
        assert_eq!(criteria.skip, 0);
    }

    #[test]
    fn test_allow_list_policies() {
        let base = QueryTranslator::new().with_allowed_fields(["title", "category"]);
        let params = [("category", "horror"), ("secret", "1")];

        let ignored = base
            .clone()
            .with_unknown_fields(UnknownFieldPolicy::Ignore)
            .translate(params)
            .unwrap();
        assert_eq!(
            ignored.filter,
            Some(Expr::field("category".into(), FieldOp::Eq, Bson::String("horror".into())))
        );

        let allowed = base
            .clone()
            .with_unknown_fields(UnknownFieldPolicy::Allow)
            .translate(params)
            .unwrap();
        assert!(matches!(allowed.filter, Some(Expr::And(ref list)) if list.len() == 2));

        let rejected = base
            .with_unknown_fields(UnknownFieldPolicy::Reject)
            .translate(params);
        assert!(matches!(rejected, Err(DocumentStoreError::InvalidQuery(_))));
    }

    #[test]
    fn test_operator_fields_are_never_forwarded() {
        let criteria = translate(&[("$where", "1"), ("purchaseHistory.$", "x")]);
        assert!(criteria.filter.is_none());

        let rejected = QueryTranslator::new()
            .with_unknown_fields(UnknownFieldPolicy::Reject)
            .translate([("$where", "1")]);
        assert!(rejected.is_err());
    }

    #[test]
    fn test_first_page_links() {
        let criteria = translate(&[("category", "fantasy")]);
        let links = criteria.links("http://localhost:3001/books", 25);

        assert_eq!(links.previous, None);
        assert_eq!(links.first, None);
        assert_eq!(
            links.next.as_deref(),
            Some("http://localhost:3001/books?category=fantasy&skip=10&limit=10")
        );
        assert_eq!(
            links.last.as_deref(),
            Some("http://localhost:3001/books?category=fantasy&skip=20&limit=10")
        );
        assert_eq!(criteria.total_pages(25), 3);
    }

    #[test]
    fn test_middle_and_last_page_links() {
        let criteria = translate(&[("skip", "15"), ("limit", "10"), ("sort", "-price")]);
        let links = criteria.links("http://localhost:3001/books", 30);

        assert_eq!(
            links.previous.as_deref(),
            Some("http://localhost:3001/books?sort=-price&skip=5&limit=10")
        );
        assert_eq!(
            links.first.as_deref(),
            Some("http://localhost:3001/books?sort=-price&skip=0&limit=10")
        );
        assert_eq!(
            links.next.as_deref(),
            Some("http://localhost:3001/books?sort=-price&skip=25&limit=10")
        );

        let end = translate(&[("skip", "20"), ("limit", "10")]);
        let links = end.links("http://localhost:3001/books", 30);
        assert!(links.next.is_none());
        assert!(links.last.is_none());
        assert!(links.previous.is_some());
    }

    #[test]
    fn test_links_for_empty_results() {
        let criteria = translate(&[]);
        assert_eq!(criteria.links("http://localhost/books", 0), PageLinks::default());
        assert_eq!(criteria.total_pages(0), 0);
    }

    #[test]
    fn test_skip_past_the_end_has_no_forward_links() {
        let skip = usize::MAX.to_string();
        let criteria = translate(&[("skip", skip.as_str()), ("limit", "5")]);
        let links = criteria.links("http://localhost/books", 5);

        assert_eq!(criteria.skip, usize::MAX);
        assert!(links.next.is_none());
        assert!(links.last.is_none());
        assert_eq!(
            links.first.as_deref(),
            Some("http://localhost/books?skip=0&limit=5")
        );
    }

    #[test]
    fn test_ignored_filters_are_left_out_of_links() {
        let criteria = QueryTranslator::new()
            .with_allowed_fields(["category"])
            .with_unknown_fields(UnknownFieldPolicy::Ignore)
            .translate([("colour", "red"), ("category", "horror")])
            .unwrap();
        let links = criteria.links("http://localhost/books", 30);

        assert_eq!(
            links.next.as_deref(),
            Some("http://localhost/books?category=horror&skip=10&limit=10")
        );
    }

    #[test]
    fn test_operator_keys_are_encoded_in_links() {
        let criteria = translate(&[("price>", "10")]);
        let links = criteria.links("http://localhost/books", 100);

        assert_eq!(
            links.next.as_deref(),
            Some("http://localhost/books?price%3E=10&skip=10&limit=10")
        );
    }
}
