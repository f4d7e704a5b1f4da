use crate::{
    config::Config,
    infrastructure::repositories::{
        sqlx_blog_repository::SqlxBlogRepository, sqlx_category_repository::SqlxCategoryRepository,
        sqlx_story_repository::SqlxStoryRepository, sqlx_user_repository::SqlxUserRepository,
    },
};
use sqlx::PgPool;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub config: Config,
    pub blog_repo: Arc<SqlxBlogRepository>,
    pub user_repo: Arc<SqlxUserRepository>,
    pub category_repo: Arc<SqlxCategoryRepository>,
    pub story_repo: Arc<SqlxStoryRepository>,
}
