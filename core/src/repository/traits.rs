use async_trait::async_trait;

use crate::model::task::{Task, TaskDraft, TaskId};
use crate::Result;

/// The four operations the remote collection supports. One remote call
/// each, no retry, no caching beyond the returned payload.
#[async_trait]
pub trait TaskRepository: Send + Sync {
    async fn list(&self) -> Result<Vec<Task>>;

    /// The server assigns the id.
    async fn create(&self, draft: &TaskDraft) -> Result<Task>;

    /// Full replacement of all mutable fields, not a partial patch.
    async fn update(&self, id: TaskId, draft: &TaskDraft) -> Result<Task>;

    async fn delete(&self, id: TaskId) -> Result<()>;
}
