pub mod sql;
pub mod sqlx_blog_repository;
pub mod sqlx_category_repository;
pub mod sqlx_story_repository;
pub mod sqlx_user_repository;
