//! Convenient re-exports of commonly used types.
//!
//! ```ignore
//! use bookshelf::prelude::*;
//! ```

pub use bookshelf_core::{
    backend::{ArrayElementUpdate, StoreBackend, StoreBackendBuilder},
    collection::{Collection, TypedCollection},
    document::{Document, DocumentExt, ID_FIELD},
    error::{DocumentStoreError, DocumentStoreResult},
    page::{Page, PageLinks},
    query::{ElementMatch, Expr, FieldOp, Filter, Projection, Query, QueryBuilder, Sort, SortDirection},
    querystring::{QueryCriteria, QueryTranslator, UnknownFieldPolicy},
    store::DocumentStore,
};
