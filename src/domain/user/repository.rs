use super::entity::{User, UserPatch};
use crate::domain::shared::errors::DomainError;
use async_trait::async_trait;
use uuid::Uuid;

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, DomainError>;
    async fn update(&self, id: Uuid, patch: &UserPatch) -> Result<(), DomainError>;
    async fn delete(&self, id: Uuid) -> Result<(), DomainError>;

    /// Add `blog_id` to the user's saved set and return the updated profile.
    async fn save_blog(&self, user_id: Uuid, blog_id: Uuid) -> Result<User, DomainError>;
    async fn unsave_blog(&self, user_id: Uuid, blog_id: Uuid) -> Result<User, DomainError>;
}
