use async_trait::async_trait;
use reqwest::{Client, Response};
use tracing::debug;

use crate::error::Error;
use crate::model::task::{Task, TaskDraft, TaskId};
use crate::repository::traits::TaskRepository;
use crate::Result;

/// REST client for a single task collection endpoint:
/// `GET base`, `POST base`, `PUT base/{id}`, `DELETE base/{id}`.
pub struct HttpTaskRepository {
    client: Client,
    base_url: String,
}

impl HttpTaskRepository {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn item_url(&self, id: TaskId) -> String {
        format!("{}/{}", self.base_url, id)
    }
}

/// Map a non-2xx status onto the error taxonomy. A 404 only means
/// "stale id" on the id-scoped calls, hence the `Option`.
fn classify(status: u16, id: Option<TaskId>, detail: &str) -> Error {
    let message = if detail.is_empty() {
        format!("status {status}")
    } else {
        format!("status {status}: {detail}")
    };
    match (status, id) {
        (404, Some(id)) => Error::NotFound(id),
        (s, _) if (400..500).contains(&s) => Error::Validation(message),
        _ => Error::Server(message),
    }
}

async fn into_error(res: Response, id: Option<TaskId>) -> Error {
    let status = res.status().as_u16();
    let body = res.text().await.unwrap_or_default();
    classify(status, id, body.trim())
}

fn malformed(err: reqwest::Error) -> Error {
    Error::Server(format!("malformed response: {err}"))
}

#[async_trait]
impl TaskRepository for HttpTaskRepository {
    async fn list(&self) -> Result<Vec<Task>> {
        debug!(url = %self.base_url, "GET task collection");
        let res = self
            .client
            .get(&self.base_url)
            .send()
            .await
            .map_err(Error::Network)?;
        if !res.status().is_success() {
            return Err(into_error(res, None).await);
        }
        res.json::<Vec<Task>>().await.map_err(malformed)
    }

    async fn create(&self, draft: &TaskDraft) -> Result<Task> {
        debug!(url = %self.base_url, "POST new task");
        let res = self
            .client
            .post(&self.base_url)
            .json(draft)
            .send()
            .await
            .map_err(Error::Network)?;
        if !res.status().is_success() {
            return Err(into_error(res, None).await);
        }
        res.json::<Task>().await.map_err(malformed)
    }

    async fn update(&self, id: TaskId, draft: &TaskDraft) -> Result<Task> {
        let url = self.item_url(id);
        debug!(%url, "PUT task replacement");
        let res = self
            .client
            .put(&url)
            .json(draft)
            .send()
            .await
            .map_err(Error::Network)?;
        if !res.status().is_success() {
            return Err(into_error(res, Some(id)).await);
        }
        res.json::<Task>().await.map_err(malformed)
    }

    async fn delete(&self, id: TaskId) -> Result<()> {
        let url = self.item_url(id);
        debug!(%url, "DELETE task");
        let res = self
            .client
            .delete(&url)
            .send()
            .await
            .map_err(Error::Network)?;
        if !res.status().is_success() {
            return Err(into_error(res, Some(id)).await);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stale_id_maps_to_not_found() {
        assert!(matches!(classify(404, Some(7), ""), Error::NotFound(7)));
    }

    #[test]
    fn collection_404_is_not_a_stale_id() {
        assert!(matches!(classify(404, None, ""), Error::Validation(_)));
    }

    #[test]
    fn client_errors_map_to_validation() {
        assert!(matches!(classify(400, None, "bad title"), Error::Validation(_)));
        assert!(matches!(classify(422, Some(3), ""), Error::Validation(_)));
    }

    #[test]
    fn server_errors_map_to_server() {
        assert!(matches!(classify(500, Some(1), ""), Error::Server(_)));
        assert!(matches!(classify(503, None, "down"), Error::Server(_)));
    }

    #[test]
    fn trailing_slash_is_normalized() {
        let repo = HttpTaskRepository::new("http://localhost:8080/api/tasks/");
        assert_eq!(repo.item_url(4), "http://localhost:8080/api/tasks/4");
    }
}
