//! User route handlers.

use axum::{
    Json,
    extract::{Path, Query, State, rejection::JsonRejection},
    http::StatusCode,
};
use bookshelf::backend::StoreBackend;
use bookshelf_catalog::{
    users::UserService,
    models::{NewUser, User},
};
use serde_json::Value;
use tracing::instrument;

use super::{Created, Listing, parse_id};
use crate::{error::Result, state::AppState};

const ENTITY: &str = "User";

/// List users matching the query string.
#[instrument(skip(state, params))]
pub async fn list<B: StoreBackend + 'static>(
    State(state): State<AppState<B>>,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<Json<Listing<User>>> {
    let criteria = state.user_queries().translate(params)?;
    let page = UserService::new(state.store())
        .list(&criteria, &state.url("/users"))
        .await?;

    Ok(Json(Listing::new("users", page)))
}

#[instrument(skip(state))]
pub async fn get<B: StoreBackend + 'static>(
    State(state): State<AppState<B>>,
    Path(id): Path<String>,
) -> Result<Json<User>> {
    let id = parse_id(ENTITY, &id)?;
    Ok(Json(UserService::new(state.store()).get(id).await?))
}

#[instrument(skip(state, payload))]
pub async fn create<B: StoreBackend + 'static>(
    State(state): State<AppState<B>>,
    payload: std::result::Result<Json<NewUser>, JsonRejection>,
) -> Result<(StatusCode, Json<Created>)> {
    let Json(input) = payload?;
    let id = UserService::new(state.store()).create(input).await?;

    Ok((StatusCode::CREATED, Json(id.into())))
}

#[instrument(skip(state, payload))]
pub async fn update<B: StoreBackend + 'static>(
    State(state): State<AppState<B>>,
    Path(id): Path<String>,
    payload: std::result::Result<Json<Value>, JsonRejection>,
) -> Result<Json<User>> {
    let id = parse_id(ENTITY, &id)?;
    let Json(body) = payload?;

    Ok(Json(UserService::new(state.store()).update(id, body).await?))
}

#[instrument(skip(state))]
pub async fn delete<B: StoreBackend + 'static>(
    State(state): State<AppState<B>>,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    let id = parse_id(ENTITY, &id)?;
    UserService::new(state.store()).delete(id).await?;

    Ok(StatusCode::NO_CONTENT)
}
