//! Blog endpoints.
//!
//! Every list endpoint goes through the shared listing pipeline; failures
//! there surface as a generic 500 echoing the underlying message. Relationship
//! mutations (like, save) pre-check existence and return 404 on a miss.

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
    domain::blog::{
        entity::{Blog, BlogPatch, NewBlog},
        repository::BlogRepository,
    },
    domain::shared::query::ListingParams,
    domain::user::repository::UserRepository,
    infrastructure::repositories::sqlx_blog_repository::SqlxBlogRepository,
    presentation::http::{errors::AppError, state::AppState},
};

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateBlogRequest {
    pub user: Uuid,
    pub category: Uuid,
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(min = 1, max = 500))]
    pub description: String,
    #[validate(length(min = 1))]
    pub content: String,
    #[validate(url)]
    pub image_url: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBlogRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    #[validate(length(min = 1, max = 500))]
    pub description: Option<String>,
    #[validate(length(min = 1))]
    pub content: Option<String>,
    #[validate(url)]
    pub image_url: Option<String>,
    pub category: Option<Uuid>,
}

/// Body of the by-user/by-category listings: the owning id plus the usual
/// listing parameter surface.
#[derive(Debug, Deserialize)]
pub struct OwnerListingRequest {
    pub id: Uuid,
    #[serde(flatten)]
    pub params: ListingParams,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReactionRequest {
    pub blog_id: Uuid,
    pub user_id: Uuid,
}

pub async fn add_blog(
    State(state): State<AppState>,
    Json(body): Json<CreateBlogRequest>,
) -> Result<Json<Blog>, AppError> {
    body.validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let blog = state
        .blog_repo
        .create(&NewBlog {
            user_id: body.user,
            category_id: body.category,
            title: body.title,
            description: body.description,
            content: body.content,
            image_url: body.image_url,
        })
        .await?;
    Ok(Json(blog))
}

pub async fn get_all_blogs(
    State(state): State<AppState>,
    Query(params): Query<ListingParams>,
) -> Result<Json<Listing<Blog>>, AppError> {
    let result = listing::run(
        state.blog_repo.as_ref(),
        SqlxBlogRepository::scope_all(),
        &params,
    )
    .await
    .map_err(|e| AppError::Internal(format!("Get all blogs failed: {e}")))?;
    Ok(Json(result))
}

pub async fn get_blog(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Blog>, AppError> {
    let blog = state
        .blog_repo
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound("blog".into()))?;
    Ok(Json(blog))
}

pub async fn get_blogs_by_user(
    State(state): State<AppState>,
    Json(body): Json<OwnerListingRequest>,
) -> Result<Json<Listing<Blog>>, AppError> {
    let result = listing::run(
        state.blog_repo.as_ref(),
        SqlxBlogRepository::scope_by_user(body.id),
        &body.params,
    )
    .await
    .map_err(|e| AppError::Internal(format!("Get blogs by user failed: {e}")))?;
    Ok(Json(result))
}

pub async fn get_blogs_by_category(
    State(state): State<AppState>,
    Json(body): Json<OwnerListingRequest>,
) -> Result<Json<Listing<Blog>>, AppError> {
    let result = listing::run(
        state.blog_repo.as_ref(),
        SqlxBlogRepository::scope_by_category(body.id),
        &body.params,
    )
    .await
    .map_err(|e| AppError::Internal(format!("Get blogs by category failed: {e}")))?;
    Ok(Json(result))
}

pub async fn update_blog(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateBlogRequest>,
) -> Result<Json<Blog>, AppError> {
    body.validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    state
        .blog_repo
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound("blog".into()))?;

    state
        .blog_repo
        .update(
            id,
            &BlogPatch {
                title: body.title,
                description: body.description,
                content: body.content,
                image_url: body.image_url,
                category_id: body.category,
            },
        )
        .await?;

    let blog = state
        .blog_repo
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound("blog".into()))?;
    Ok(Json(blog))
}

pub async fn delete_blog(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    state
        .blog_repo
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound("blog".into()))?;

    state.blog_repo.delete(id).await?;
    Ok(Json(json!({ "message": "Blog deleted" })))
}

pub async fn like_blog(
    State(state): State<AppState>,
    Json(body): Json<ReactionRequest>,
) -> Result<Json<Blog>, AppError> {
    state
        .blog_repo
        .find_by_id(body.blog_id)
        .await?
        .ok_or_else(|| AppError::NotFound("blog".into()))?;

    let blog = state.blog_repo.add_like(body.blog_id, body.user_id).await?;
    Ok(Json(blog))
}

pub async fn unlike_blog(
    State(state): State<AppState>,
    Json(body): Json<ReactionRequest>,
) -> Result<Json<Blog>, AppError> {
    state
        .blog_repo
        .find_by_id(body.blog_id)
        .await?
        .ok_or_else(|| AppError::NotFound("blog".into()))?;

    let blog = state
        .blog_repo
        .remove_like(body.blog_id, body.user_id)
        .await?;
    Ok(Json(blog))
}

pub async fn save_blog(
    State(state): State<AppState>,
    Json(body): Json<ReactionRequest>,
) -> Result<Json<crate::domain::user::entity::User>, AppError> {
    state
        .user_repo
        .find_by_id(body.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("user".into()))?;
    state
        .blog_repo
        .find_by_id(body.blog_id)
        .await?
        .ok_or_else(|| AppError::NotFound("blog".into()))?;

    let user = state.user_repo.save_blog(body.user_id, body.blog_id).await?;
    Ok(Json(user))
}

pub async fn unsave_blog(
    State(state): State<AppState>,
    Json(body): Json<ReactionRequest>,
) -> Result<Json<crate::domain::user::entity::User>, AppError> {
    state
        .user_repo
        .find_by_id(body.user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("user".into()))?;
    state
        .blog_repo
        .find_by_id(body.blog_id)
        .await?
        .ok_or_else(|| AppError::NotFound("blog".into()))?;

    let user = state
        .user_repo
        .unsave_blog(body.user_id, body.blog_id)
        .await?;
    Ok(Json(user))
}

/// Saved-blogs listing: the same pipeline scoped to the user's saved set.
#[derive(Debug, Deserialize)]
pub struct SavedListingQuery {
    pub id: Uuid,
    #[serde(flatten)]
    pub params: ListingParams,
}

pub async fn get_saved_blogs(
    State(state): State<AppState>,
    Query(query): Query<SavedListingQuery>,
) -> Result<Json<Listing<Blog>>, AppError> {
    let user = state
        .user_repo
        .find_by_id(query.id)
        .await?
        .ok_or_else(|| AppError::NotFound("user".into()))?;

    let result = listing::run(
        state.blog_repo.as_ref(),
        SqlxBlogRepository::scope_within(user.saved_blogs),
        &query.params,
    )
    .await
    .map_err(|e| AppError::Internal(format!("Get saved blogs failed: {e}")))?;
    Ok(Json(result))
}
