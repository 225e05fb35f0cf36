//! Catalog and account models.
//!
//! Field names are camelCase in storage and on the wire, so query-string filter keys
//! address stored fields directly.

use std::collections::HashMap;

use bookshelf::document::Document;
use bson::Uuid;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CatalogError, CatalogResult};

pub type Timestamp = DateTime<Utc>;

/// Invariant checks run before anything is written.
pub trait Validate {
    /// # Errors
    ///
    /// Returns [`CatalogError::Validation`] describing the first violated rule.
    fn validate(&self) -> CatalogResult<()>;
}

fn require_text(field: &str, value: &str) -> CatalogResult<()> {
    if value.trim().is_empty() {
        return Err(CatalogError::validation(format!("{field} must not be empty")));
    }
    Ok(())
}

fn require_price(price: f64) -> CatalogResult<()> {
    if !price.is_finite() || price < 0.0 {
        return Err(CatalogError::validation(format!(
            "price must be a non-negative number, got {price}"
        )));
    }
    Ok(())
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    History,
    Horror,
    Romance,
    Fantasy,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    pub id: Uuid,
    pub asin: String,
    pub title: String,
    pub img: String,
    pub price: f64,
    pub category: Category,
    /// Author references, in credit order.
    #[serde(default)]
    pub authors: Vec<Uuid>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Book {
    /// Fields a listing may filter on.
    pub const FILTERABLE_FIELDS: &'static [&'static str] = &[
        "id", "asin", "title", "img", "price", "category", "authors", "createdAt", "updatedAt",
    ];

    pub fn new(input: NewBook, now: Timestamp) -> Self {
        Self {
            id: Uuid::new(),
            asin: input.asin,
            title: input.title,
            img: input.img,
            price: input.price,
            category: input.category,
            authors: input.authors,
            created_at: now,
            updated_at: now,
        }
    }
}

impl Document for Book {
    fn id(&self) -> &Uuid {
        &self.id
    }

    fn collection_name() -> &'static str {
        "books"
    }
}

impl Validate for Book {
    fn validate(&self) -> CatalogResult<()> {
        require_text("asin", &self.asin)?;
        require_text("title", &self.title)?;
        require_text("img", &self.img)?;
        require_price(self.price)
    }
}

/// Request body for creating a book.
#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct NewBook {
    pub asin: String,
    pub title: String,
    pub img: String,
    pub price: f64,
    pub category: Category,
    #[serde(default)]
    pub authors: Vec<Uuid>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Author {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Author {
    pub const FILTERABLE_FIELDS: &'static [&'static str] =
        &["id", "firstName", "lastName", "createdAt", "updatedAt"];

    pub fn new(input: NewAuthor, now: Timestamp) -> Self {
        Self {
            id: Uuid::new(),
            first_name: input.first_name,
            last_name: input.last_name,
            created_at: now,
            updated_at: now,
        }
    }
}

impl Document for Author {
    fn id(&self) -> &Uuid {
        &self.id
    }

    fn collection_name() -> &'static str {
        "authors"
    }
}

impl Validate for Author {
    fn validate(&self) -> CatalogResult<()> {
        require_text("firstName", &self.first_name)?;
        require_text("lastName", &self.last_name)
    }
}

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct NewAuthor {
    pub first_name: String,
    pub last_name: String,
}

/// Name-only view of an author, substituted for author references in book responses.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AuthorSummary {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
}

impl From<Author> for AuthorSummary {
    fn from(author: Author) -> Self {
        Self {
            id: author.id,
            first_name: author.first_name,
            last_name: author.last_name,
        }
    }
}

/// A book as returned to clients, with author references resolved.
///
/// Listings may project fields away; everything but `id` is then absent.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BookView {
    pub id: Uuid,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub asin: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub img: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authors: Option<Vec<AuthorSummary>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<Timestamp>,
}

/// A stored book read back through a projection.
#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ProjectedBook {
    pub id: Uuid,
    pub asin: Option<String>,
    pub title: Option<String>,
    pub img: Option<String>,
    pub price: Option<f64>,
    pub category: Option<Category>,
    pub authors: Option<Vec<Uuid>>,
    pub created_at: Option<Timestamp>,
    pub updated_at: Option<Timestamp>,
}

impl ProjectedBook {
    /// Replaces author references with summaries. References to deleted authors are
    /// dropped; the remaining order is preserved.
    pub fn resolve(self, authors: &HashMap<Uuid, AuthorSummary>) -> BookView {
        BookView {
            id: self.id,
            asin: self.asin,
            title: self.title,
            img: self.img,
            price: self.price,
            category: self.category,
            authors: self.authors.map(|ids| {
                ids.iter()
                    .filter_map(|id| authors.get(id).cloned())
                    .collect()
            }),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

impl From<Book> for ProjectedBook {
    fn from(book: Book) -> Self {
        Self {
            id: book.id,
            asin: Some(book.asin),
            title: Some(book.title),
            img: Some(book.img),
            price: Some(book.price),
            category: Some(book.category),
            authors: Some(book.authors),
            created_at: Some(book.created_at),
            updated_at: Some(book.updated_at),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(default)]
    pub date_of_birth: Option<NaiveDate>,
    /// Books bought, oldest first.
    #[serde(default)]
    pub purchase_history: Vec<PurchaseRecord>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl User {
    pub const FILTERABLE_FIELDS: &'static [&'static str] = &[
        "id", "firstName", "lastName", "email", "dateOfBirth", "purchaseHistory", "createdAt",
        "updatedAt",
    ];

    pub fn new(input: NewUser, now: Timestamp) -> Self {
        Self {
            id: Uuid::new(),
            first_name: input.first_name,
            last_name: input.last_name,
            email: input.email,
            date_of_birth: input.date_of_birth,
            purchase_history: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn history_item(&self, record_id: Uuid) -> Option<&PurchaseRecord> {
        self.purchase_history
            .iter()
            .find(|record| record.id == record_id)
    }
}

impl Document for User {
    fn id(&self) -> &Uuid {
        &self.id
    }

    fn collection_name() -> &'static str {
        "users"
    }
}

impl Validate for User {
    fn validate(&self) -> CatalogResult<()> {
        require_text("firstName", &self.first_name)?;
        require_text("lastName", &self.last_name)?;

        if !self.email.contains('@') {
            return Err(CatalogError::validation(format!(
                "email '{}' is not a valid address",
                self.email
            )));
        }
        Ok(())
    }
}

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(default)]
    pub date_of_birth: Option<NaiveDate>,
}

/// Snapshot of a book at purchase time, embedded in the buyer's purchase history.
///
/// Later changes to the book, including its deletion, do not affect the record.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseRecord {
    pub id: Uuid,
    pub asin: String,
    pub title: String,
    pub img: String,
    pub price: f64,
    pub category: Category,
    #[serde(default)]
    pub authors: Vec<Uuid>,
    pub purchase_date: Timestamp,
}

impl PurchaseRecord {
    pub fn snapshot(book: &Book, purchase_date: Timestamp) -> Self {
        Self {
            id: Uuid::new(),
            asin: book.asin.clone(),
            title: book.title.clone(),
            img: book.img.clone(),
            price: book.price,
            category: book.category,
            authors: book.authors.clone(),
            purchase_date,
        }
    }
}

impl Validate for PurchaseRecord {
    fn validate(&self) -> CatalogResult<()> {
        require_text("asin", &self.asin)?;
        require_text("title", &self.title)?;
        require_text("img", &self.img)?;
        require_price(self.price)
    }
}

#[cfg(test)]
mod tests {
    use bookshelf::document::DocumentExt;

    use super::*;

    fn book() -> Book {
        Book::new(
            NewBook {
                asin: "0441172717".into(),
                title: "Dune".into(),
                img: "https://images/dune.jpg".into(),
                price: 12.5,
                category: Category::Fantasy,
                authors: vec![],
            },
            Utc::now(),
        )
    }

    #[test]
    fn test_book_validation() {
        assert!(book().validate().is_ok());

        let mut negative = book();
        negative.price = -1.0;
        assert!(matches!(negative.validate(), Err(CatalogError::Validation(_))));

        let mut blank = book();
        blank.title = "  ".into();
        assert!(blank.validate().is_err());

        let mut nan = book();
        nan.price = f64::NAN;
        assert!(nan.validate().is_err());
    }

    #[test]
    fn test_category_rejects_unknown_values() {
        let parsed = serde_json::from_value::<Category>(serde_json::json!("scifi"));
        assert!(parsed.is_err());
        assert_eq!(
            serde_json::to_value(Category::Horror).unwrap(),
            serde_json::json!("horror")
        );
    }

    #[test]
    fn test_snapshot_copies_book_with_fresh_identity() {
        let book = book();
        let record = PurchaseRecord::snapshot(&book, Utc::now());

        assert_ne!(record.id, book.id);
        assert_eq!(record.title, book.title);
        assert_eq!(record.price, book.price);
        assert_eq!(record.category, book.category);
    }

    #[test]
    fn test_user_validation() {
        let user = User::new(
            NewUser {
                first_name: "Paul".into(),
                last_name: "Atreides".into(),
                email: "paul.example.com".into(),
                date_of_birth: None,
            },
            Utc::now(),
        );

        assert!(user.validate().is_err());
    }

    #[test]
    fn test_book_view_omits_projected_fields() {
        let view = BookView {
            id: Uuid::new(),
            asin: None,
            title: Some("Dune".into()),
            img: None,
            price: None,
            category: None,
            authors: None,
            created_at: None,
            updated_at: None,
        };

        let json = serde_json::to_value(&view).unwrap();
        let keys = json.as_object().unwrap().keys().cloned().collect::<Vec<_>>();
        assert_eq!(keys, vec!["id".to_string(), "title".to_string()]);
    }

    #[test]
    fn test_ids_are_text_in_json_and_binary_in_storage() {
        let author = Uuid::new();
        let mut book = book();
        book.authors = vec![author];

        let json = serde_json::to_value(&book).unwrap();
        assert_eq!(json["id"], serde_json::json!(book.id.to_string()));
        assert_eq!(json["authors"], serde_json::json!([author.to_string()]));

        let stored = book.to_bson_document().unwrap();
        assert_eq!(stored.get("id"), Some(&bson::Bson::from(book.id)));
        assert_eq!(
            stored.get_array("authors").unwrap(),
            &vec![bson::Bson::from(author)]
        );

        let from_json: Book = serde_json::from_value(json).unwrap();
        let from_storage = Book::from_bson(bson::Bson::Document(stored)).unwrap();
        assert_eq!(from_json.id, book.id);
        assert_eq!(from_storage, book);
    }

    #[test]
    fn test_purchase_record_ids_are_binary_in_storage() {
        let book = book();
        let mut user = User::new(
            NewUser {
                first_name: "Paul".into(),
                last_name: "Atreides".into(),
                email: "paul@arrakis.example".into(),
                date_of_birth: None,
            },
            Utc::now(),
        );
        let record = PurchaseRecord::snapshot(&book, Utc::now());
        user.purchase_history.push(record.clone());

        let stored = user.to_bson_document().unwrap();
        let history = stored.get_array("purchaseHistory").unwrap();
        let stored_record = history[0].as_document().unwrap();

        assert_eq!(stored_record.get("id"), Some(&bson::Bson::from(record.id)));
        assert_eq!(
            bson::ser::serialize_to_bson(&record).unwrap().as_document().unwrap(),
            stored_record
        );
    }
}
