use super::entity::{Blog, BlogPatch, NewBlog};
use crate::domain::shared::errors::DomainError;
use async_trait::async_trait;
use uuid::Uuid;

#[async_trait]
pub trait BlogRepository: Send + Sync {
    async fn create(&self, blog: &NewBlog) -> Result<Blog, DomainError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Blog>, DomainError>;
    async fn update(&self, id: Uuid, patch: &BlogPatch) -> Result<(), DomainError>;
    async fn delete(&self, id: Uuid) -> Result<(), DomainError>;

    /// Record `user_id` as a like on `blog_id` and return the updated post.
    async fn add_like(&self, blog_id: Uuid, user_id: Uuid) -> Result<Blog, DomainError>;
    async fn remove_like(&self, blog_id: Uuid, user_id: Uuid) -> Result<Blog, DomainError>;
}
