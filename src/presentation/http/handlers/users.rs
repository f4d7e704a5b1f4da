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
    domain::shared::query::ListingParams,
    domain::user::{
        entity::{User, UserPatch},
        repository::UserRepository,
    },
    presentation::http::{errors::AppError, state::AppState},
};

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserRequest {
    #[validate(length(min = 1, max = 50))]
    pub username: Option<String>,
    #[validate(url)]
    pub avatar_url: Option<String>,
}

pub async fn get_all_users(
    State(state): State<AppState>,
    Query(params): Query<ListingParams>,
) -> Result<Json<Listing<User>>, AppError> {
    let result = listing::run(state.user_repo.as_ref(), Vec::new(), &params)
        .await
        .map_err(|e| AppError::Internal(format!("Get all users failed: {e}")))?;
    Ok(Json(result))
}

pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<User>, AppError> {
    let user = state
        .user_repo
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound("user".into()))?;
    Ok(Json(user))
}

pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateUserRequest>,
) -> Result<Json<User>, AppError> {
    body.validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    state
        .user_repo
        .update(
            id,
            &UserPatch {
                username: body.username,
                avatar_url: body.avatar_url,
            },
        )
        .await?;

    let user = state
        .user_repo
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound("user".into()))?;
    Ok(Json(user))
}

pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    state.user_repo.delete(id).await?;
    Ok(Json(json!({ "message": "User deleted" })))
}
