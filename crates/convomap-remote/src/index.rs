//! Remote embedding-index service client.
//!
//! The service names one index per course (`"{prefix}{course}"`) and models
//! update as delete-then-reinsert under an exclusive per-index write lock.
//! HTTP statuses are mapped to structured error kinds in exactly one place.

use std::time::Duration;

use async_trait::async_trait;
use convomap_config::EndpointConfig;
use convomap_core::error::IndexError;
use convomap_core::locate::{IndexSnapshot, SnapshotRecord};
use convomap_core::service::{IndexHandle, IndexService};
use convomap_core::types::{IndexDescriptor, IndexedRecord, RowId};
use log::debug;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

/// How often to re-poll a held write lock.
const LOCK_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Client for the remote index service.
pub struct HttpIndexService {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    map_name_prefix: String,
}

impl HttpIndexService {
    /// Build a client from config; the session is reused for the process
    /// lifetime.
    pub fn new(config: &EndpointConfig, map_name_prefix: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            map_name_prefix: map_name_prefix.to_string(),
        }
    }

    /// Remote index name for a course.
    fn index_name(&self, course: &str) -> String {
        format!("{}{course}", self.map_name_prefix)
    }

    fn project_url(&self, course: &str) -> String {
        format!(
            "{}/v1/projects/{}",
            self.base_url,
            urlencoding::encode(&self.index_name(course))
        )
    }

    async fn project_info(&self, course: &str) -> Result<ProjectInfo, IndexError> {
        let response = self
            .client
            .get(self.project_url(course))
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|err| IndexError::Remote(err.to_string()))?;
        let response = check(response).await?;
        response
            .json()
            .await
            .map_err(|err| IndexError::Decode(err.to_string()))
    }
}

#[derive(Debug, Deserialize)]
struct ProjectInfo {
    id: String,
    #[serde(default)]
    map_link: Option<String>,
}

#[derive(Serialize)]
struct CreateProjectRequest<'a> {
    name: String,
    unique_id_field: &'static str,
    topic_label_field: &'static str,
    build_topic_model: bool,
    records: &'a [IndexedRecord],
}

#[derive(Serialize)]
struct AddRecordsRequest<'a> {
    records: &'a [IndexedRecord],
}

#[derive(Serialize)]
struct DeleteRecordsRequest<'a> {
    row_ids: &'a [RowId],
}

#[derive(Deserialize)]
struct SnapshotResponse {
    records: Vec<SnapshotRecord>,
}

#[async_trait]
impl IndexService for HttpIndexService {
    async fn open(&self, course: &str) -> Result<Box<dyn IndexHandle>, IndexError> {
        let info = self.project_info(course).await?;
        debug!("opened index (course={course}, project_id={})", info.id);
        Ok(Box::new(HttpIndexHandle {
            client: self.client.clone(),
            base_url: self.base_url.clone(),
            api_key: self.api_key.clone(),
            project_id: info.id,
        }))
    }

    async fn bulk_create(
        &self,
        course: &str,
        records: &[IndexedRecord],
    ) -> Result<(), IndexError> {
        let response = self
            .client
            .post(format!("{}/v1/projects", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&CreateProjectRequest {
                name: self.index_name(course),
                unique_id_field: "row_id",
                topic_label_field: "first_query",
                build_topic_model: true,
                records,
            })
            .send()
            .await
            .map_err(|err| IndexError::Remote(err.to_string()))?;
        check(response).await?;
        Ok(())
    }

    async fn descriptor(&self, course: &str) -> Result<IndexDescriptor, IndexError> {
        let info = self.project_info(course).await?;
        Ok(IndexDescriptor {
            index_id: Some(format!("iframe{}", info.id)),
            index_link: info.map_link,
        })
    }
}

/// Handle bound to one opened index.
struct HttpIndexHandle {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    project_id: String,
}

impl HttpIndexHandle {
    fn url(&self, suffix: &str) -> String {
        format!("{}/v1/projects/{}/{suffix}", self.base_url, self.project_id)
    }

    async fn post_json<T: Serialize + Sync>(
        &self,
        suffix: &str,
        body: &T,
    ) -> Result<(), IndexError> {
        let response = self
            .client
            .post(self.url(suffix))
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|err| IndexError::Remote(err.to_string()))?;
        check(response).await?;
        Ok(())
    }
}

#[async_trait]
impl IndexHandle for HttpIndexHandle {
    async fn snapshot(&self) -> Result<IndexSnapshot, IndexError> {
        let response = self
            .client
            .get(self.url("records"))
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|err| IndexError::Remote(err.to_string()))?;
        let response = check(response).await?;
        let body: SnapshotResponse = response
            .json()
            .await
            .map_err(|err| IndexError::Decode(err.to_string()))?;
        Ok(IndexSnapshot::new(body.records))
    }

    async fn acquire_lock(&self) -> Result<(), IndexError> {
        loop {
            let response = self
                .client
                .post(self.url("lock"))
                .bearer_auth(&self.api_key)
                .send()
                .await
                .map_err(|err| IndexError::Remote(err.to_string()))?;
            match check(response).await {
                Ok(_) => return Ok(()),
                Err(IndexError::Contention(reason)) => {
                    debug!(
                        "write lock held, polling (project_id={}, reason={reason})",
                        self.project_id
                    );
                    tokio::time::sleep(LOCK_POLL_INTERVAL).await;
                }
                Err(err) => return Err(err),
            }
        }
    }

    async fn release_lock(&self) -> Result<(), IndexError> {
        let response = self
            .client
            .delete(self.url("lock"))
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|err| IndexError::Remote(err.to_string()))?;
        check(response).await?;
        Ok(())
    }

    async fn delete(&self, row_ids: &[RowId]) -> Result<(), IndexError> {
        self.post_json("records/delete", &DeleteRecordsRequest { row_ids })
            .await
    }

    async fn add(&self, records: &[IndexedRecord]) -> Result<(), IndexError> {
        self.post_json("records", &AddRecordsRequest { records })
            .await
    }

    async fn rebuild(&self) -> Result<(), IndexError> {
        let response = self
            .client
            .post(self.url("rebuild"))
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|err| IndexError::Remote(err.to_string()))?;
        check(response).await?;
        Ok(())
    }
}

/// Map a response to an error kind unless it is a success.
async fn check(response: reqwest::Response) -> Result<reqwest::Response, IndexError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(error_for_status(status, body))
}

/// Single place where remote statuses become structured error kinds.
fn error_for_status(status: StatusCode, body: String) -> IndexError {
    match status {
        StatusCode::NOT_FOUND => IndexError::NotConfigured(body),
        StatusCode::LOCKED | StatusCode::CONFLICT => IndexError::Contention(body),
        _ => IndexError::Remote(format!("{status}: {body}")),
    }
}

#[cfg(test)]
mod tests {
    use super::{error_for_status, HttpIndexService};
    use convomap_config::EndpointConfig;
    use convomap_core::error::IndexError;
    use pretty_assertions::assert_eq;
    use reqwest::StatusCode;

    #[test]
    fn statuses_map_to_structured_kinds() {
        assert!(matches!(
            error_for_status(StatusCode::NOT_FOUND, String::new()),
            IndexError::NotConfigured(_)
        ));
        assert!(matches!(
            error_for_status(StatusCode::LOCKED, String::new()),
            IndexError::Contention(_)
        ));
        assert!(matches!(
            error_for_status(StatusCode::CONFLICT, String::new()),
            IndexError::Contention(_)
        ));
        assert!(matches!(
            error_for_status(StatusCode::INTERNAL_SERVER_ERROR, String::new()),
            IndexError::Remote(_)
        ));
    }

    #[test]
    fn index_names_carry_the_prefix() {
        let service = HttpIndexService::new(
            &EndpointConfig {
                base_url: "https://index.example/".to_string(),
                api_key: "k".to_string(),
            },
            "Conversation Map for ",
        );
        assert_eq!(service.index_name("cs101"), "Conversation Map for cs101");
        assert_eq!(
            service.project_url("cs101"),
            "https://index.example/v1/projects/Conversation%20Map%20for%20cs101"
        );
    }
}
