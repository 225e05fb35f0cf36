//! A thin document store abstraction for the bookshelf service.
//!
//! This crate provides:
//!
//! - **Document traits** ([`document`]) - Core traits for defining and serializing documents
//! - **Store backend abstraction** ([`backend`]) - Traits for implementing storage backends
//! - **Query and filtering API** ([`query`]) - Backend-neutral query construction and filtering
//! - **Query strings** ([`querystring`]) - Translation of HTTP query strings into queries
//! - **Collections interface** ([`collection`]) - High-level API for document collections
//! - **Document store** ([`store`]) - Main interface for working with typed or untyped documents
//! - **Error handling** ([`error`]) - Error and result types
//! - **Pagination** ([`page`]) - Page results and navigation links
//!
//! # Example
//!
//! ```ignore
//! use bookshelf_core::document::Document;
//! use bson::Uuid;
//! use serde::{Serialize, Deserialize};
//!
//! #[derive(Debug, Clone, Serialize, Deserialize)]
//! pub struct Author {
//!     pub id: Uuid,
//!     pub first_name: String,
//! }
//!
//! impl Document for Author {
//!     fn id(&self) -> &Uuid {
//!         &self.id
//!     }
//!
//!     fn collection_name() -> &'static str {
//!         "authors"
//!     }
//! }
//! ```

pub mod backend;
pub mod collection;
pub mod document;
pub mod error;
pub mod page;
pub mod query;
pub mod querystring;
pub mod store;
