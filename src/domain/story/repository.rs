use super::entity::{NewStory, Story};
use crate::domain::shared::errors::DomainError;
use async_trait::async_trait;
use uuid::Uuid;

#[async_trait]
pub trait StoryRepository: Send + Sync {
    async fn create(&self, story: &NewStory) -> Result<Story, DomainError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Story>, DomainError>;
    async fn update(&self, id: Uuid, content: &str, image_url: Option<&str>)
    -> Result<(), DomainError>;
    async fn delete(&self, id: Uuid) -> Result<(), DomainError>;
}
