//! Author route handlers.

use axum::{
    Json,
    extract::{Path, Query, State, rejection::JsonRejection},
    http::StatusCode,
};
use bookshelf::backend::StoreBackend;
use bookshelf_catalog::{
    authors::AuthorService,
    models::{Author, NewAuthor},
};
use serde_json::Value;
use tracing::instrument;

use super::{Created, Listing, parse_id};
use crate::{error::Result, state::AppState};

const ENTITY: &str = "Author";

/// List authors matching the query string.
#[instrument(skip(state, params))]
pub async fn list<B: StoreBackend + 'static>(
    State(state): State<AppState<B>>,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<Json<Listing<Author>>> {
    let criteria = state.author_queries().translate(params)?;
    let page = AuthorService::new(state.store())
        .list(&criteria, &state.url("/authors"))
        .await?;

    Ok(Json(Listing::new("authors", page)))
}

#[instrument(skip(state))]
pub async fn get<B: StoreBackend + 'static>(
    State(state): State<AppState<B>>,
    Path(id): Path<String>,
) -> Result<Json<Author>> {
    let id = parse_id(ENTITY, &id)?;
    Ok(Json(AuthorService::new(state.store()).get(id).await?))
}

#[instrument(skip(state, payload))]
pub async fn create<B: StoreBackend + 'static>(
    State(state): State<AppState<B>>,
    payload: std::result::Result<Json<NewAuthor>, JsonRejection>,
) -> Result<(StatusCode, Json<Created>)> {
    let Json(input) = payload?;
    let id = AuthorService::new(state.store()).create(input).await?;

    Ok((StatusCode::CREATED, Json(id.into())))
}

#[instrument(skip(state, payload))]
pub async fn update<B: StoreBackend + 'static>(
    State(state): State<AppState<B>>,
    Path(id): Path<String>,
    payload: std::result::Result<Json<Value>, JsonRejection>,
) -> Result<Json<Author>> {
    let id = parse_id(ENTITY, &id)?;
    let Json(body) = payload?;

    Ok(Json(AuthorService::new(state.store()).update(id, body).await?))
}

#[instrument(skip(state))]
pub async fn delete<B: StoreBackend + 'static>(
    State(state): State<AppState<B>>,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    let id = parse_id(ENTITY, &id)?;
    AuthorService::new(state.store()).delete(id).await?;

    Ok(StatusCode::NO_CONTENT)
}
