use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use crate::{
    application::listing::{self, Listing},
    domain::category::{entity::Category, repository::CategoryRepository},
    domain::shared::query::ListingParams,
    presentation::http::{errors::AppError, state::AppState},
};

#[derive(Debug, Deserialize, Validate)]
pub struct CategoryRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(length(max = 500))]
    pub description: Option<String>,
}

pub async fn add_category(
    State(state): State<AppState>,
    Json(body): Json<CategoryRequest>,
) -> Result<Json<Category>, AppError> {
    body.validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let category = state
        .category_repo
        .create(body.name.trim(), body.description.as_deref())
        .await?;
    Ok(Json(category))
}

pub async fn get_all_categories(
    State(state): State<AppState>,
    Query(params): Query<ListingParams>,
) -> Result<Json<Listing<Category>>, AppError> {
    let result = listing::run(state.category_repo.as_ref(), Vec::new(), &params)
        .await
        .map_err(|e| AppError::Internal(format!("Get all categories failed: {e}")))?;
    Ok(Json(result))
}

pub async fn get_category(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Category>, AppError> {
    let category = state
        .category_repo
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound("category".into()))?;
    Ok(Json(category))
}

pub async fn update_category(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<CategoryRequest>,
) -> Result<Json<Category>, AppError> {
    body.validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    state
        .category_repo
        .update(id, body.name.trim(), body.description.as_deref())
        .await?;

    let category = state
        .category_repo
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound("category".into()))?;
    Ok(Json(category))
}

pub async fn delete_category(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    state.category_repo.delete(id).await?;
    Ok(Json(json!({ "message": "Category deleted" })))
}
