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
    domain::story::{
        entity::{NewStory, Story},
        repository::StoryRepository,
    },
    infrastructure::repositories::sqlx_story_repository::SqlxStoryRepository,
    presentation::http::{errors::AppError, state::AppState},
};

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateStoryRequest {
    pub user: Uuid,
    #[validate(length(min = 1, max = 2000))]
    pub content: String,
    #[validate(url)]
    pub image_url: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStoryRequest {
    #[validate(length(min = 1, max = 2000))]
    pub content: String,
    #[validate(url)]
    pub image_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UserStoriesRequest {
    pub id: Uuid,
    #[serde(flatten)]
    pub params: ListingParams,
}

pub async fn add_story(
    State(state): State<AppState>,
    Json(body): Json<CreateStoryRequest>,
) -> Result<Json<Story>, AppError> {
    body.validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let story = state
        .story_repo
        .create(&NewStory {
            user_id: body.user,
            content: body.content,
            image_url: body.image_url,
        })
        .await?;
    Ok(Json(story))
}

pub async fn get_all_stories(
    State(state): State<AppState>,
    Query(params): Query<ListingParams>,
) -> Result<Json<Listing<Story>>, AppError> {
    let result = listing::run(state.story_repo.as_ref(), Vec::new(), &params)
        .await
        .map_err(|e| AppError::Internal(format!("Get all stories failed: {e}")))?;
    Ok(Json(result))
}

pub async fn get_story(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Story>, AppError> {
    let story = state
        .story_repo
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound("story".into()))?;
    Ok(Json(story))
}

pub async fn get_stories_by_user(
    State(state): State<AppState>,
    Json(body): Json<UserStoriesRequest>,
) -> Result<Json<Listing<Story>>, AppError> {
    let result = listing::run(
        state.story_repo.as_ref(),
        SqlxStoryRepository::scope_by_user(body.id),
        &body.params,
    )
    .await
    .map_err(|e| AppError::Internal(format!("Get stories by user failed: {e}")))?;
    Ok(Json(result))
}

pub async fn update_story(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateStoryRequest>,
) -> Result<Json<Story>, AppError> {
    body.validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    state
        .story_repo
        .update(id, &body.content, body.image_url.as_deref())
        .await?;

    let story = state
        .story_repo
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound("story".into()))?;
    Ok(Json(story))
}

pub async fn delete_story(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    state.story_repo.delete(id).await?;
    Ok(Json(json!({ "message": "Story deleted" })))
}
