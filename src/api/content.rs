//! Content API
//!
//! In-memory JSON collections served behind the cache middleware. The
//! handlers know nothing about caching; they only signal cacheability
//! through their status codes.

use std::collections::HashMap;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Extension, Json,
};
use parking_lot::RwLock;
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use crate::api::AppState;
use crate::error::{ApiError, Result};
use crate::models::{DeleteResponse, ItemPayload};

// == Collection ==
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Builds,
    Dictionary,
    TierLists,
}

impl Collection {
    pub const ALL: [Collection; 3] = [
        Collection::Builds,
        Collection::Dictionary,
        Collection::TierLists,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Builds => "builds",
            Collection::Dictionary => "dictionary",
            Collection::TierLists => "tier-lists",
        }
    }

    /// Base path of the collection, e.g. `/api/builds`.
    pub fn base_path(&self) -> String {
        format!("/api/{}", self.as_str())
    }

    /// Cache key pattern covering every cached read of the collection.
    pub fn invalidation_pattern(&self) -> String {
        format!("{}*", self.base_path())
    }
}

// == Content Store ==
/// Items per collection, kept in creation order.
#[derive(Debug, Default)]
pub struct ContentStore {
    collections: RwLock<HashMap<Collection, Vec<(String, Value)>>>,
}

impl ContentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn list(&self, collection: Collection) -> Vec<Value> {
        self.collections
            .read()
            .get(&collection)
            .map(|items| items.iter().map(|(_, v)| v.clone()).collect())
            .unwrap_or_default()
    }

    pub fn get(&self, collection: Collection, id: &str) -> Option<Value> {
        self.collections
            .read()
            .get(&collection)?
            .iter()
            .find(|(item_id, _)| item_id == id)
            .map(|(_, v)| v.clone())
    }

    /// Stores a new item under a fresh id and returns it.
    pub fn create(&self, collection: Collection, payload: ItemPayload) -> Value {
        let id = Uuid::new_v4().to_string();
        let item = payload.into_item(&id);
        self.collections
            .write()
            .entry(collection)
            .or_default()
            .push((id, item.clone()));
        item
    }

    /// Replaces an existing item; None when the id is unknown.
    pub fn replace(&self, collection: Collection, id: &str, payload: ItemPayload) -> Option<Value> {
        let mut guard = self.collections.write();
        let slot = guard
            .get_mut(&collection)?
            .iter_mut()
            .find(|(item_id, _)| item_id == id)?;
        slot.1 = payload.into_item(id);
        Some(slot.1.clone())
    }

    pub fn delete(&self, collection: Collection, id: &str) -> bool {
        let mut guard = self.collections.write();
        match guard.get_mut(&collection) {
            Some(items) => {
                let before = items.len();
                items.retain(|(item_id, _)| item_id != id);
                items.len() < before
            }
            None => false,
        }
    }
}

fn not_found(collection: Collection, id: &str) -> ApiError {
    ApiError::NotFound(format!("{}/{} not found", collection.as_str(), id))
}

fn parse_payload(
    payload: std::result::Result<Json<ItemPayload>, JsonRejection>,
) -> Result<ItemPayload> {
    let Json(payload) = payload.map_err(|e| ApiError::InvalidRequest(e.body_text()))?;
    if let Some(error_msg) = payload.validate() {
        return Err(ApiError::InvalidRequest(error_msg));
    }
    Ok(payload)
}

// == Handlers ==
/// Handler for GET /api/<collection>
pub async fn list_items(
    State(state): State<AppState>,
    Extension(collection): Extension<Collection>,
) -> Json<Vec<Value>> {
    Json(state.content.list(collection))
}

/// Handler for GET /api/<collection>/:id
pub async fn get_item(
    State(state): State<AppState>,
    Extension(collection): Extension<Collection>,
    Path(id): Path<String>,
) -> Result<Json<Value>> {
    state
        .content
        .get(collection, &id)
        .map(Json)
        .ok_or_else(|| not_found(collection, &id))
}

/// Handler for POST /api/<collection>
pub async fn create_item(
    State(state): State<AppState>,
    Extension(collection): Extension<Collection>,
    payload: std::result::Result<Json<ItemPayload>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>)> {
    let payload = parse_payload(payload)?;
    let item = state.content.create(collection, payload);
    debug!(collection = collection.as_str(), "item created");
    Ok((StatusCode::CREATED, Json(item)))
}

/// Handler for PUT /api/<collection>/:id
pub async fn replace_item(
    State(state): State<AppState>,
    Extension(collection): Extension<Collection>,
    Path(id): Path<String>,
    payload: std::result::Result<Json<ItemPayload>, JsonRejection>,
) -> Result<Json<Value>> {
    let payload = parse_payload(payload)?;
    state
        .content
        .replace(collection, &id, payload)
        .map(Json)
        .ok_or_else(|| not_found(collection, &id))
}

/// Handler for DELETE /api/<collection>/:id
pub async fn delete_item(
    State(state): State<AppState>,
    Extension(collection): Extension<Collection>,
    Path(id): Path<String>,
) -> Result<Json<DeleteResponse>> {
    if state.content.delete(collection, &id) {
        Ok(Json(DeleteResponse::new(id)))
    } else {
        Err(not_found(collection, &id))
    }
}
