//! Purchase history route handlers.

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
};
use bookshelf::{backend::StoreBackend, bson::Uuid};
use bookshelf_catalog::{
    models::{PurchaseRecord, User},
    purchases::PurchaseService,
    users::UserService,
};
use serde::Deserialize;
use serde_json::Value;
use tracing::instrument;

use super::parse_id;
use crate::{error::Result, state::AppState};

const USER: &str = "User";
const RECORD: &str = "Purchase record";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseRequest {
    pub book_id: String,
}

#[instrument(skip(state, payload))]
pub async fn purchase<B: StoreBackend + 'static>(
    State(state): State<AppState<B>>,
    Path(user_id): Path<String>,
    payload: std::result::Result<Json<PurchaseRequest>, JsonRejection>,
) -> Result<Json<User>> {
    let user_id = parse_id(USER, &user_id)?;
    let Json(request) = payload?;
    let book_id = parse_id("Book", &request.book_id)?;

    Ok(Json(
        PurchaseService::new(state.store())
            .purchase(user_id, book_id)
            .await?,
    ))
}

#[instrument(skip(state))]
pub async fn list<B: StoreBackend + 'static>(
    State(state): State<AppState<B>>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<PurchaseRecord>>> {
    let user_id = parse_id(USER, &user_id)?;

    Ok(Json(
        PurchaseService::new(state.store())
            .list_history(user_id)
            .await?,
    ))
}

#[instrument(skip(state))]
pub async fn get<B: StoreBackend + 'static>(
    State(state): State<AppState<B>>,
    Path((user_id, record_id)): Path<(String, String)>,
) -> Result<Json<PurchaseRecord>> {
    let user_id = parse_id(USER, &user_id)?;
    let record_id = parse_id(RECORD, &record_id)?;

    Ok(Json(
        PurchaseService::new(state.store())
            .get_history_item(user_id, record_id)
            .await?,
    ))
}

#[instrument(skip(state, payload))]
pub async fn update<B: StoreBackend + 'static>(
    State(state): State<AppState<B>>,
    Path((user_id, record_id)): Path<(String, String)>,
    payload: std::result::Result<Json<Value>, JsonRejection>,
) -> Result<Json<User>> {
    let user_id = parse_id(USER, &user_id)?;
    let record_id = parse_id(RECORD, &record_id)?;
    let Json(body) = payload?;

    Ok(Json(
        PurchaseService::new(state.store())
            .update_history_item(user_id, record_id, body)
            .await?,
    ))
}

/// Removing a record that is not in the history, including one whose id is not a UUID,
/// returns the user unchanged. Only a missing user is not found.
#[instrument(skip(state))]
pub async fn remove<B: StoreBackend + 'static>(
    State(state): State<AppState<B>>,
    Path((user_id, record_id)): Path<(String, String)>,
) -> Result<Json<User>> {
    let user_id = parse_id(USER, &user_id)?;

    let user = match Uuid::parse_str(&record_id) {
        Ok(record_id) => {
            PurchaseService::new(state.store())
                .remove_history_item(user_id, record_id)
                .await?
        }
        Err(_) => UserService::new(state.store()).get(user_id).await?,
    };

    Ok(Json(user))
}
