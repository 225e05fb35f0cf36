//! Translation of the bookshelf query AST into MongoDB query syntax.

use bson::{Bson, Document, doc};

use bookshelf_core::{
    document::ID_FIELD,
    error::DocumentStoreError,
    query::{Expr, FieldOp, Projection, QueryVisitor, Sort, SortDirection},
};

use crate::sanitizer::FieldSanitizer;

/// Translates filter expressions into MongoDB filter documents.
///
/// String operators become anchored, escaped, case-sensitive regular expressions so they
/// agree with the in-memory backend.
pub(crate) struct MongoQueryTranslator;

impl MongoQueryTranslator {
    /// Builds the filter document for an optional expression.
    pub(crate) fn filter(expr: Option<&Expr>) -> Result<Document, DocumentStoreError> {
        match expr {
            Some(expr) => MongoQueryTranslator.visit_expr(expr),
            None => Ok(doc! {}),
        }
    }

    /// Builds the sort document, most significant key first.
    pub(crate) fn sort(sort: &[Sort]) -> Option<Document> {
        (!sort.is_empty()).then(|| {
            sort.iter()
                .map(|key| {
                    (
                        FieldSanitizer::sanitize_path(&key.field),
                        Bson::Int32(match key.direction {
                            SortDirection::Asc => 1,
                            SortDirection::Desc => -1,
                        }),
                    )
                })
                .collect()
        })
    }

    /// Builds the projection document. The internal `_id` is always dropped by the store
    /// afterwards, so only the public identity field is forced in.
    pub(crate) fn projection(projection: &Projection) -> Document {
        match projection {
            Projection::Include(fields) => {
                let mut doc = fields
                    .iter()
                    .map(|field| (FieldSanitizer::sanitize_path(field), Bson::Int32(1)))
                    .collect::<Document>();
                doc.insert(ID_FIELD, 1);
                doc
            }
            Projection::Exclude(fields) => fields
                .iter()
                .filter(|field| !projection.keeps(field))
                .map(|field| (FieldSanitizer::sanitize_path(field), Bson::Int32(0)))
                .collect(),
        }
    }
}

fn escape_regex(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if "\\^$.|?*+()[]{}".contains(c) {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn as_list(value: &Bson) -> Bson {
    match value {
        Bson::Array(_) => value.clone(),
        single => Bson::Array(vec![single.clone()]),
    }
}

impl QueryVisitor for MongoQueryTranslator {
    type Output = Document;
    type Error = DocumentStoreError;

    fn visit_and(&mut self, exprs: &[Expr]) -> Result<Self::Output, Self::Error> {
        Ok(doc! {
            "$and": exprs
                .iter()
                .map(|expr| self.visit_expr(expr))
                .collect::<Result<Vec<_>, _>>()?,
        })
    }

    fn visit_or(&mut self, exprs: &[Expr]) -> Result<Self::Output, Self::Error> {
        Ok(doc! {
            "$or": exprs
                .iter()
                .map(|expr| self.visit_expr(expr))
                .collect::<Result<Vec<_>, _>>()?,
        })
    }

    fn visit_not(&mut self, expr: &Expr) -> Result<Self::Output, Self::Error> {
        // `$not` only applies to a field; `$nor` negates a whole expression.
        Ok(doc! {
            "$nor": [self.visit_expr(expr)?],
        })
    }

    fn visit_exists(
        &mut self,
        field: &str,
        should_exist: bool,
    ) -> Result<Self::Output, Self::Error> {
        let path = FieldSanitizer::sanitize_path(field);

        Ok(doc! { path: { "$exists": should_exist } })
    }

    fn visit_field(
        &mut self,
        field: &str,
        op: &FieldOp,
        value: &Bson,
    ) -> Result<Self::Output, Self::Error> {
        let condition = match op {
            FieldOp::Eq => doc! { "$eq": value },
            FieldOp::Ne => doc! { "$ne": value },
            FieldOp::Gt => doc! { "$gt": value },
            FieldOp::Gte => doc! { "$gte": value },
            FieldOp::Lt => doc! { "$lt": value },
            FieldOp::Lte => doc! { "$lte": value },
            FieldOp::Contains => match value {
                Bson::String(s) => doc! { "$regex": escape_regex(s) },
                Bson::Array(arr) => doc! { "$all": arr },
                other => doc! { "$eq": other },
            },
            FieldOp::NotContains => match value {
                Bson::String(s) => doc! { "$not": { "$regex": escape_regex(s) } },
                Bson::Array(arr) => doc! { "$nin": arr },
                other => doc! { "$ne": other },
            },
            FieldOp::StartsWith => match value {
                Bson::String(s) => doc! { "$regex": format!("^{}", escape_regex(s)) },
                _ => {
                    return Err(DocumentStoreError::InvalidQuery(format!(
                        "'{field}' prefix match requires a string value"
                    )));
                }
            },
            FieldOp::EndsWith => match value {
                Bson::String(s) => doc! { "$regex": format!("{}$", escape_regex(s)) },
                _ => {
                    return Err(DocumentStoreError::InvalidQuery(format!(
                        "'{field}' suffix match requires a string value"
                    )));
                }
            },
            FieldOp::AnyOf => doc! { "$in": as_list(value) },
            FieldOp::NoneOf => doc! { "$nin": as_list(value) },
        };

        let path = FieldSanitizer::sanitize_path(field);

        Ok(doc! { path: condition })
    }
}

#[cfg(test)]
mod tests {
    use bookshelf_core::query::Filter;

    use super::*;

    fn translate(expr: Expr) -> Document {
        MongoQueryTranslator::filter(Some(&expr)).unwrap()
    }

    #[test]
    fn test_comparisons_and_conjunction() {
        let filter = translate(Filter::and([
            Filter::eq("category", "horror"),
            Filter::gte("price", 10_i64),
        ]));

        assert_eq!(
            filter,
            doc! { "$and": [
                { "category": { "$eq": "horror" } },
                { "price": { "$gte": 10_i64 } },
            ] }
        );
    }

    #[test]
    fn test_regex_operators_are_escaped() {
        assert_eq!(
            translate(Filter::starts_with("title", "C++ (2nd")),
            doc! { "title": { "$regex": "^C\\+\\+ \\(2nd" } }
        );
        assert_eq!(
            translate(Filter::ends_with("title", "a.b")),
            doc! { "title": { "$regex": "a\\.b$" } }
        );
        assert!(MongoQueryTranslator::filter(Some(&Filter::starts_with("price", 3))).is_err());
    }

    #[test]
    fn test_negation_uses_nor() {
        assert_eq!(
            translate(Filter::exists("img").not()),
            doc! { "$nor": [{ "img": { "$exists": true } }] }
        );
    }

    #[test]
    fn test_membership_wraps_scalars() {
        assert_eq!(
            translate(Filter::any_of("category", "fantasy")),
            doc! { "category": { "$in": ["fantasy"] } }
        );
    }

    #[test]
    fn test_operator_like_fields_are_escaped() {
        assert_eq!(
            translate(Filter::eq("$where", 1)),
            doc! { "__dollar__where": { "$eq": 1 } }
        );
    }

    #[test]
    fn test_sort_and_projection_documents() {
        let sort = MongoQueryTranslator::sort(&[
            Sort { field: "category".into(), direction: SortDirection::Asc },
            Sort { field: "price".into(), direction: SortDirection::Desc },
        ])
        .unwrap();
        assert_eq!(sort, doc! { "category": 1, "price": -1 });
        assert!(MongoQueryTranslator::sort(&[]).is_none());

        let include = MongoQueryTranslator::projection(&Projection::Include(vec!["title".into()]));
        assert_eq!(include, doc! { "title": 1, "id": 1 });

        let exclude = MongoQueryTranslator::projection(&Projection::Exclude(vec![
            "id".into(),
            "img".into(),
        ]));
        assert_eq!(exclude, doc! { "img": 0 });
    }
}
