//! Book catalog and customer accounts on top of the `bookshelf` document store.
//!
//! Each service borrows a [`DocumentStore`] and is cheap to construct per request:
//!
//! - [`books::BookService`] - paginated, filterable listing with author resolution
//! - [`authors::AuthorService`] and [`users::UserService`] - plain record management
//! - [`purchases::PurchaseService`] - purchase history embedded in user records
//!
//! ```ignore
//! let store = DocumentStore::new(InMemoryStore::default());
//! bookshelf_catalog::init_indexes(&store).await?;
//!
//! let criteria = QueryTranslator::new().translate([("category", "fantasy")])?;
//! let page = BookService::new(&store).list(&criteria, "http://localhost:3001/books").await?;
//! ```

pub mod authors;
pub mod books;
pub mod error;
pub mod models;
pub mod patch;
pub mod purchases;
pub mod users;

use bookshelf::{backend::StoreBackend, document::Document, store::DocumentStore};

use crate::{
    error::CatalogResult,
    models::{Author, Book, User},
};

/// Creates the indexes the catalog relies on. Idempotent.
///
/// # Errors
///
/// Returns an error if the backend fails to create an index.
pub async fn init_indexes<B: StoreBackend>(store: &DocumentStore<B>) -> CatalogResult<()> {
    for collection in [
        Book::collection_name(),
        Author::collection_name(),
        User::collection_name(),
    ] {
        store.add_index(collection, "id", true).await?;
    }
    store.add_index(Book::collection_name(), "category", false).await?;

    tracing::info!("catalog indexes ready");
    Ok(())
}

#[cfg(test)]
pub(crate) mod testing {
    use bookshelf::{memory::InMemoryStore, store::DocumentStore};

    use crate::models::{Category, NewAuthor, NewBook, NewUser};

    pub fn store() -> DocumentStore<InMemoryStore> {
        DocumentStore::new(InMemoryStore::default())
    }

    pub fn new_author(first_name: &str, last_name: &str) -> NewAuthor {
        NewAuthor {
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
        }
    }

    pub fn new_book(title: &str, price: f64, authors: Vec<bson::Uuid>) -> NewBook {
        NewBook {
            asin: format!("ASIN-{title}"),
            title: title.to_string(),
            img: format!("https://images.example.com/{title}.jpg"),
            price,
            category: Category::Fantasy,
            authors,
        }
    }

    pub fn new_user(first_name: &str) -> NewUser {
        NewUser {
            first_name: first_name.to_string(),
            last_name: "Atreides".to_string(),
            email: format!("{}@arrakis.example", first_name.to_lowercase()),
            date_of_birth: None,
        }
    }
}
