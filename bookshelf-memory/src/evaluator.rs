//! Query expression evaluation for in-memory document filtering.
//!
//! Field names are dotted paths. A path segment that lands on an array fans out over its
//! embedded documents, so `purchaseHistory.title` resolves to every record's title.
//!
//! Positive operators match when any resolved value matches; `Ne`, `NoneOf` and
//! `NotContains` match when no resolved value matches, which includes a missing field.

use std::{cmp::Ordering, collections::HashMap};

use bson::{Bson, datetime::DateTime};

use bookshelf_core::{
    error::{DocumentStoreError, DocumentStoreResult},
    query::{Expr, FieldOp, Projection, QueryVisitor, Sort, SortDirection},
};

/// Type-erased, comparable representation of BSON values.
///
/// Integers and floats are normalized to `f64`; binary values (UUIDs) compare bytewise.
#[derive(Debug)]
pub(crate) enum Comparable<'a> {
    Null,
    Bool(bool),
    Number(f64),
    DateTime(DateTime),
    String(&'a str),
    Bytes(&'a [u8]),
    Array(Vec<Comparable<'a>>),
    Map(HashMap<&'a str, Comparable<'a>>),
}

impl<'a> From<&'a Bson> for Comparable<'a> {
    fn from(bson: &'a Bson) -> Self {
        match bson {
            Bson::Null => Comparable::Null,
            Bson::Boolean(value) => Comparable::Bool(*value),
            Bson::Int32(value) => Comparable::Number(*value as f64),
            Bson::Int64(value) => Comparable::Number(*value as f64),
            Bson::Double(value) => Comparable::Number(*value),
            Bson::DateTime(value) => Comparable::DateTime(*value),
            Bson::String(value) => Comparable::String(value),
            Bson::Binary(binary) => Comparable::Bytes(&binary.bytes),
            Bson::Array(arr) => Comparable::Array(arr.iter().map(Comparable::from).collect()),
            Bson::Document(doc) => Comparable::Map(
                doc.iter()
                    .map(|(k, v)| (k.as_str(), Comparable::from(v)))
                    .collect(),
            ),
            _ => Comparable::Null,
        }
    }
}

impl Comparable<'_> {
    /// Position in the cross-type sort order, following MongoDB's BSON comparison order.
    fn rank(&self) -> u8 {
        match self {
            Comparable::Null => 0,
            Comparable::Number(_) => 1,
            Comparable::String(_) => 2,
            Comparable::Map(_) => 3,
            Comparable::Array(_) => 4,
            Comparable::Bytes(_) => 5,
            Comparable::Bool(_) => 6,
            Comparable::DateTime(_) => 7,
        }
    }

    /// Total ordering used for sorting: same-type values compare by value, different types
    /// by rank.
    fn sort_cmp(&self, other: &Self) -> Ordering {
        self.partial_cmp(other)
            .unwrap_or_else(|| self.rank().cmp(&other.rank()))
    }
}

impl PartialEq for Comparable<'_> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Comparable::Null, Comparable::Null) => true,
            (Comparable::Bool(a), Comparable::Bool(b)) => a == b,
            (Comparable::Number(a), Comparable::Number(b)) => a == b,
            (Comparable::DateTime(a), Comparable::DateTime(b)) => a == b,
            (Comparable::String(a), Comparable::String(b)) => a == b,
            (Comparable::Bytes(a), Comparable::Bytes(b)) => a == b,
            (Comparable::Array(a), Comparable::Array(b)) => a == b,
            (Comparable::Map(a), Comparable::Map(b)) => a == b,
            _ => false,
        }
    }
}

impl PartialOrd for Comparable<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Comparable::Null, Comparable::Null) => Some(Ordering::Equal),
            (Comparable::Bool(a), Comparable::Bool(b)) => a.partial_cmp(b),
            (Comparable::Number(a), Comparable::Number(b)) => a.partial_cmp(b),
            (Comparable::DateTime(a), Comparable::DateTime(b)) => a.partial_cmp(b),
            (Comparable::String(a), Comparable::String(b)) => a.partial_cmp(b),
            (Comparable::Bytes(a), Comparable::Bytes(b)) => a.partial_cmp(b),
            _ => None,
        }
    }
}

/// Resolves a dotted path against a document.
pub(crate) fn resolve<'a>(document: &'a Bson, path: &str) -> Vec<&'a Bson> {
    let segments = path.split('.').collect::<Vec<_>>();
    let mut found = Vec::new();

    collect(document, &segments, &mut found);
    found
}

fn collect<'a>(value: &'a Bson, segments: &[&str], found: &mut Vec<&'a Bson>) {
    let Some((head, rest)) = segments.split_first() else {
        found.push(value);
        return;
    };

    match value {
        Bson::Document(doc) => {
            if let Some(next) = doc.get(*head) {
                collect(next, rest, found);
            }
        }
        Bson::Array(items) => items
            .iter()
            .filter(|item| matches!(item, Bson::Document(_)))
            .for_each(|item| collect(item, segments, found)),
        _ => {}
    }
}

/// Orders two documents by a list of sort keys. Missing fields sort as null.
pub(crate) fn compare_documents(a: &Bson, b: &Bson, sort: &[Sort]) -> Ordering {
    for key in sort {
        let left = resolve(a, &key.field)
            .first()
            .map(|v| Comparable::from(*v))
            .unwrap_or(Comparable::Null);
        let right = resolve(b, &key.field)
            .first()
            .map(|v| Comparable::from(*v))
            .unwrap_or(Comparable::Null);

        let ordering = match key.direction {
            SortDirection::Asc => left.sort_cmp(&right),
            SortDirection::Desc => right.sort_cmp(&left),
        };

        if ordering != Ordering::Equal {
            return ordering;
        }
    }

    Ordering::Equal
}

/// Applies a projection to the top-level fields of a document.
pub(crate) fn project(document: Bson, projection: &Projection) -> Bson {
    match document {
        Bson::Document(doc) => Bson::Document(
            doc.into_iter()
                .filter(|(key, _)| projection.keeps(key))
                .collect(),
        ),
        other => other,
    }
}

pub(crate) struct DocumentEvaluator<'a> {
    document: &'a Bson,
}

impl<'a> DocumentEvaluator<'a> {
    pub fn new(document: &'a Bson) -> Self {
        Self { document }
    }

    pub fn evaluate(&mut self, expr: &Expr) -> DocumentStoreResult<bool> {
        self.visit_expr(expr)
    }

    pub fn filter_documents(
        documents: impl IntoIterator<Item = &'a Bson>,
        expr: &Expr,
    ) -> DocumentStoreResult<Vec<Bson>> {
        let mut matched = Vec::new();

        for doc in documents {
            if DocumentEvaluator::new(doc).evaluate(expr)? {
                matched.push(doc.clone());
            }
        }

        Ok(matched)
    }

    fn document(&self) -> DocumentStoreResult<&'a Bson> {
        match self.document {
            Bson::Document(_) => Ok(self.document),
            other => Err(DocumentStoreError::InvalidDocument(format!(
                "cannot evaluate a filter against {:?}",
                other.element_type()
            ))),
        }
    }
}

/// Returns `true` if a single resolved value satisfies a positive operator.
fn matches(field_value: &Bson, op: FieldOp, value: &Bson) -> bool {
    let left = Comparable::from(field_value);
    let right = Comparable::from(value);

    match op {
        FieldOp::Eq => left == right || elements(&left).any(|item| item == &right),
        FieldOp::Gt | FieldOp::Gte | FieldOp::Lt | FieldOp::Lte => {
            let accept = |ordering: Option<Ordering>| match (op, ordering) {
                (FieldOp::Gt, Some(Ordering::Greater)) => true,
                (FieldOp::Gte, Some(Ordering::Greater | Ordering::Equal)) => true,
                (FieldOp::Lt, Some(Ordering::Less)) => true,
                (FieldOp::Lte, Some(Ordering::Less | Ordering::Equal)) => true,
                _ => false,
            };

            match &left {
                Comparable::Array(items) => items.iter().any(|item| accept(item.partial_cmp(&right))),
                single => accept(single.partial_cmp(&right)),
            }
        }
        FieldOp::Contains => match (&left, &right) {
            (Comparable::Array(items), _) => items.iter().any(|item| item == &right),
            (Comparable::String(haystack), Comparable::String(needle)) => haystack.contains(needle),
            _ => false,
        },
        FieldOp::StartsWith | FieldOp::EndsWith => {
            let Comparable::String(affix) = right else {
                return false;
            };
            let test = |candidate: &Comparable| match candidate {
                Comparable::String(text) if op == FieldOp::StartsWith => text.starts_with(affix),
                Comparable::String(text) => text.ends_with(affix),
                _ => false,
            };

            test(&left) || elements(&left).any(test)
        }
        FieldOp::AnyOf => match value {
            Bson::Array(candidates) => candidates
                .iter()
                .any(|candidate| matches(field_value, FieldOp::Eq, candidate)),
            single => matches(field_value, FieldOp::Eq, single),
        },
        FieldOp::Ne | FieldOp::NoneOf | FieldOp::NotContains => false,
    }
}

fn elements<'c, 'a>(value: &'c Comparable<'a>) -> impl Iterator<Item = &'c Comparable<'a>> {
    match value {
        Comparable::Array(items) => Some(items.iter()),
        _ => None,
    }
    .into_iter()
    .flatten()
}

impl QueryVisitor for DocumentEvaluator<'_> {
    type Output = bool;
    type Error = DocumentStoreError;

    fn visit_and(&mut self, exprs: &[Expr]) -> Result<Self::Output, Self::Error> {
        for expr in exprs {
            if !self.visit_expr(expr)? {
                return Ok(false);
            }
        }

        Ok(true)
    }

    fn visit_or(&mut self, exprs: &[Expr]) -> Result<Self::Output, Self::Error> {
        for expr in exprs {
            if self.visit_expr(expr)? {
                return Ok(true);
            }
        }

        Ok(false)
    }

    fn visit_not(&mut self, expr: &Expr) -> Result<Self::Output, Self::Error> {
        Ok(!self.visit_expr(expr)?)
    }

    fn visit_exists(
        &mut self,
        field: &str,
        should_exist: bool,
    ) -> Result<Self::Output, Self::Error> {
        Ok(!resolve(self.document()?, field).is_empty() == should_exist)
    }

    fn visit_field(
        &mut self,
        field: &str,
        op: &FieldOp,
        value: &Bson,
    ) -> Result<Self::Output, Self::Error> {
        let resolved = resolve(self.document()?, field);
        let any = |positive: FieldOp| {
            resolved
                .iter()
                .any(|field_value| matches(field_value, positive, value))
        };

        Ok(match op {
            FieldOp::Ne => !any(FieldOp::Eq),
            FieldOp::NoneOf => !any(FieldOp::AnyOf),
            FieldOp::NotContains => !any(FieldOp::Contains),
            positive => any(*positive),
        })
    }
}
