//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                                     - Health check
//!
//! # Books
//! GET    /books                                      - Filterable, paginated listing
//! POST   /books                                      - Create
//! GET    /books/{id}                                 - Detail with resolved authors
//! PUT    /books/{id}                                 - Partial update
//! DELETE /books/{id}                                 - Delete
//!
//! # Authors
//! GET    /authors, POST /authors
//! GET    /authors/{id}, PUT /authors/{id}, DELETE /authors/{id}
//!
//! # Users
//! GET    /users, POST /users
//! GET    /users/{id}, PUT /users/{id}, DELETE /users/{id}
//!
//! # Purchase history
//! GET    /users/{id}/purchaseHistory                 - All records, oldest first
//! POST   /users/{id}/purchaseHistory                 - Purchase `{"bookId"}`
//! GET    /users/{id}/purchaseHistory/{recordId}      - One record
//! PUT    /users/{id}/purchaseHistory/{recordId}      - Partial update of one record
//! DELETE /users/{id}/purchaseHistory/{recordId}      - Remove one record
//! ```

pub mod authors;
pub mod books;
pub mod purchases;
pub mod users;

use std::collections::BTreeMap;

use axum::{Router, routing::get};
use bookshelf::{
    backend::StoreBackend,
    bson::Uuid,
    page::{Page, PageLinks},
};
use bookshelf_catalog::error::CatalogError;
use serde::Serialize;

use crate::{error::ApiError, state::AppState};

/// Create the full application router.
pub fn routes<B: StoreBackend + 'static>() -> Router<AppState<B>> {
    Router::new()
        .route("/health", get(health))
        .nest("/books", book_routes())
        .nest("/authors", author_routes())
        .nest("/users", user_routes())
}

/// Create the book routes router.
pub fn book_routes<B: StoreBackend + 'static>() -> Router<AppState<B>> {
    Router::new()
        .route("/", get(books::list::<B>).post(books::create::<B>))
        .route(
            "/{id}",
            get(books::get::<B>)
                .put(books::update::<B>)
                .delete(books::delete::<B>),
        )
}

/// Create the author routes router.
pub fn author_routes<B: StoreBackend + 'static>() -> Router<AppState<B>> {
    Router::new()
        .route("/", get(authors::list::<B>).post(authors::create::<B>))
        .route(
            "/{id}",
            get(authors::get::<B>)
                .put(authors::update::<B>)
                .delete(authors::delete::<B>),
        )
}

/// Create the user and purchase history routes router.
pub fn user_routes<B: StoreBackend + 'static>() -> Router<AppState<B>> {
    Router::new()
        .route("/", get(users::list::<B>).post(users::create::<B>))
        .route(
            "/{id}",
            get(users::get::<B>)
                .put(users::update::<B>)
                .delete(users::delete::<B>),
        )
        .route(
            "/{id}/purchaseHistory",
            get(purchases::list::<B>).post(purchases::purchase::<B>),
        )
        .route(
            "/{id}/purchaseHistory/{record_id}",
            get(purchases::get::<B>)
                .put(purchases::update::<B>)
                .delete(purchases::remove::<B>),
        )
}

async fn health() -> &'static str {
    "ok"
}

/// Parses a path id. Anything that is not a UUID cannot name a stored item.
fn parse_id(entity: &'static str, raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| CatalogError::not_found(entity, raw).into())
}

/// Body of a successful create.
#[derive(Serialize)]
pub struct Created {
    id: String,
}

impl From<Uuid> for Created {
    fn from(id: Uuid) -> Self {
        Self { id: id.to_string() }
    }
}

/// Listing response: pagination metadata plus the items under a resource-specific key.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Listing<T> {
    links: PageLinks,
    total_pages: usize,
    total: usize,
    #[serde(flatten)]
    items: BTreeMap<&'static str, Vec<T>>,
}

impl<T> Listing<T> {
    fn new(key: &'static str, page: Page<T>) -> Self {
        Self {
            links: page.links,
            total_pages: page.total_pages,
            total: page.total,
            items: BTreeMap::from([(key, page.items)]),
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::{
        Router,
        body::Body,
        http::{Request, StatusCode, header},
    };
    use bookshelf::{memory::InMemoryStore, store::DocumentStore};
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use crate::{app, config::ServerConfig, state::AppState};

    fn test_app() -> Router {
        app(AppState::new(
            ServerConfig::default(),
            DocumentStore::new(InMemoryStore::default()),
        ))
    }

    async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => request
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => request.body(Body::empty()).unwrap(),
        };

        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

        (status, body)
    }

    async fn create(app: &Router, uri: &str, body: Value) -> String {
        let (status, created) = send(app, "POST", uri, Some(body)).await;
        assert_eq!(status, StatusCode::CREATED, "{created}");
        created["id"].as_str().unwrap().to_string()
    }

    fn book(title: &str, price: f64, authors: &[&str]) -> Value {
        json!({
            "asin": format!("ASIN-{title}"),
            "title": title,
            "img": format!("https://images.example.com/{title}.jpg"),
            "price": price,
            "category": "fantasy",
            "authors": authors,
        })
    }

    #[tokio::test]
    async fn test_health() {
        let response = test_app()
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_book_round_trip_resolves_authors() {
        let app = test_app();
        let author = create(&app, "/authors", json!({ "firstName": "Frank", "lastName": "Herbert" })).await;
        let id = create(&app, "/books", book("Dune", 12.5, &[&author])).await;

        let (status, body) = send(&app, "GET", &format!("/books/{id}"), None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["id"], json!(id));
        assert_eq!(body["title"], json!("Dune"));
        assert_eq!(
            body["authors"],
            json!([{ "id": author, "firstName": "Frank", "lastName": "Herbert" }])
        );
    }

    #[tokio::test]
    async fn test_book_listing_shape_and_links() {
        let app = test_app();
        for (title, price) in [("Dune", 12.5), ("Emma", 4.0), ("It", 9.0)] {
            create(&app, "/books", book(title, price, &[])).await;
        }

        let (status, body) = send(&app, "GET", "/books?sort=-price&limit=2", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total"], json!(3));
        assert_eq!(body["totalPages"], json!(2));
        assert_eq!(body["books"].as_array().unwrap().len(), 2);
        assert_eq!(body["books"][0]["title"], json!("Dune"));
        assert!(body["links"].get("previous").is_none());
        assert_eq!(
            body["links"]["next"],
            json!("http://localhost:3001/books?sort=-price&skip=2&limit=2")
        );
    }

    #[tokio::test]
    async fn test_listing_ignores_unknown_filters_by_default() {
        let app = test_app();
        create(&app, "/books", book("Dune", 12.5, &[])).await;

        let (status, body) = send(&app, "GET", "/books?colour=red", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["total"], json!(1));
    }

    #[tokio::test]
    async fn test_not_found_and_bad_request() {
        let app = test_app();

        let (status, body) = send(&app, "GET", "/books/not-a-uuid", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["status"], json!(404));

        let (status, _) = send(&app, "GET", &format!("/books/{}", bookshelf::bson::Uuid::new()), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = send(&app, "POST", "/books", Some(json!({ "title": "Dune" }))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(&app, "POST", "/books", Some(book("Dune", -1.0, &[]))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_purchase_history_lifecycle() {
        let app = test_app();
        let book_id = create(&app, "/books", book("Dune", 12.5, &[])).await;
        let user_id = create(
            &app,
            "/users",
            json!({ "firstName": "Paul", "lastName": "Atreides", "email": "paul@arrakis.example" }),
        )
        .await;
        let history = format!("/users/{user_id}/purchaseHistory");

        let (status, user) = send(&app, "POST", &history, Some(json!({ "bookId": book_id }))).await;
        assert_eq!(status, StatusCode::OK);
        let record = user["purchaseHistory"][0].clone();
        let record_id = record["id"].as_str().unwrap().to_string();
        assert_ne!(record_id, book_id);
        assert!(record.get("purchaseDate").is_some());

        let (status, fetched) = send(&app, "GET", &format!("{history}/{record_id}"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(fetched, record);

        let (status, user) = send(
            &app,
            "PUT",
            &format!("{history}/{record_id}"),
            Some(json!({ "price": 9.99 })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(user["purchaseHistory"][0]["price"], json!(9.99));
        assert_eq!(user["purchaseHistory"][0]["title"], json!("Dune"));

        for _ in 0..2 {
            let (status, user) = send(&app, "DELETE", &format!("{history}/{record_id}"), None).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(user["purchaseHistory"], json!([]));
        }

        let (status, _) = send(&app, "GET", &format!("{history}/{record_id}"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_malformed_record_ids() {
        let app = test_app();
        let book_id = create(&app, "/books", book("Dune", 12.5, &[])).await;
        let user_id = create(
            &app,
            "/users",
            json!({ "firstName": "Paul", "lastName": "Atreides", "email": "paul@arrakis.example" }),
        )
        .await;
        let history = format!("/users/{user_id}/purchaseHistory");
        let (_, purchased) = send(&app, "POST", &history, Some(json!({ "bookId": book_id }))).await;

        let (status, body) = send(
            &app,
            "PUT",
            &format!("{history}/not-a-uuid"),
            Some(json!({ "price": 1.0 })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["message"].as_str().unwrap().starts_with("Purchase record"));

        let (status, user) = send(&app, "DELETE", &format!("{history}/not-a-uuid"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(user["purchaseHistory"], purchased["purchaseHistory"]);

        let missing_user = format!(
            "/users/{}/purchaseHistory/not-a-uuid",
            bookshelf::bson::Uuid::new()
        );
        let (status, _) = send(&app, "DELETE", &missing_user, None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_purchase_of_missing_book_is_not_found() {
        let app = test_app();
        let user_id = create(
            &app,
            "/users",
            json!({ "firstName": "Paul", "lastName": "Atreides", "email": "paul@arrakis.example" }),
        )
        .await;

        let (status, body) = send(
            &app,
            "POST",
            &format!("/users/{user_id}/purchaseHistory"),
            Some(json!({ "bookId": bookshelf::bson::Uuid::new().to_string() })),
        )
        .await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["message"].as_str().unwrap().starts_with("Book with id"));
    }

    #[tokio::test]
    async fn test_delete_returns_no_content() {
        let app = test_app();
        let id = create(&app, "/authors", json!({ "firstName": "Jane", "lastName": "Austen" })).await;

        let (status, _) = send(&app, "DELETE", &format!("/authors/{id}"), None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, _) = send(&app, "DELETE", &format!("/authors/{id}"), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
