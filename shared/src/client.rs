use reqwest::{Client, Response};
use tracing::{debug, instrument};

use crate::{
    wire::{
        parse_workers, AssignmentRequestBody, AvailabilityResponse, DevelopersRequestBody,
        ErrorBody, WorkerStatsRecord,
    },
    ApiError, AssignmentSubmitter, Availability, AvailabilityProvider, DeveloperProvider, Role,
    TaskStatsProvider, Worker,
};

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        ApiError::Transport(e.to_string())
    }
}

/// HTTP client for the dashboard backend `/api/*` endpoints.
#[derive(Clone, Debug)]
pub struct TaraClient {
    client: Client,
    base_url: String,
}

impl TaraClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/{path}", self.base_url)
    }

    async fn read_body(response: Response) -> Result<String, ApiError> {
        let status = response.status();
        let body = response.text().await?;
        if status.is_success() {
            return Ok(body);
        }

        let message = serde_json::from_str::<ErrorBody>(&body)
            .ok()
            .and_then(ErrorBody::into_message);
        Err(ApiError::Status {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait::async_trait]
impl DeveloperProvider for TaraClient {
    #[instrument(skip(self))]
    async fn developers(&self, role: Role) -> Result<Vec<Worker>, ApiError> {
        let response = self
            .client
            .post(self.url("getDevelopers"))
            .json(&DevelopersRequestBody { role })
            .send()
            .await?;
        let body = Self::read_body(response).await?;
        let records: Vec<WorkerStatsRecord> = serde_json::from_str(&body)?;
        debug!("Received {} developers", records.len());
        Ok(parse_workers(records))
    }
}

#[async_trait::async_trait]
impl TaskStatsProvider for TaraClient {
    #[instrument(skip(self))]
    async fn worker_stats(&self, project_route: &str) -> Result<Vec<Worker>, ApiError> {
        let response = self
            .client
            .get(self.url("fetchAssignedTasks"))
            .query(&[("projectRoute", project_route)])
            .send()
            .await?;
        let body = Self::read_body(response).await?;
        let records: Vec<WorkerStatsRecord> = serde_json::from_str(&body)?;
        debug!("Received {} stats rows", records.len());
        Ok(parse_workers(records))
    }
}

#[async_trait::async_trait]
impl AvailabilityProvider for TaraClient {
    #[instrument(skip(self))]
    async fn availability(&self, project_id: &str) -> Result<Availability, ApiError> {
        let response = self
            .client
            .get(self.url("languages"))
            .query(&[("project_id", project_id)])
            .send()
            .await?;
        let body = Self::read_body(response).await?;
        let availability: AvailabilityResponse = serde_json::from_str(&body)?;
        Ok(availability.into())
    }
}

#[async_trait::async_trait]
impl AssignmentSubmitter for TaraClient {
    #[instrument(skip(self, body), fields(role = %body.role))]
    async fn assign_tasks(
        &self,
        project_id: &str,
        body: &AssignmentRequestBody,
    ) -> Result<(), ApiError> {
        let response = self
            .client
            .post(self.url("assignTasks"))
            .query(&[("project_id", project_id)])
            .json(body)
            .send()
            .await?;
        Self::read_body(response).await.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urls_are_built_from_a_trimmed_base() {
        let client = TaraClient::new("http://localhost:5000/");
        assert_eq!(client.base_url(), "http://localhost:5000");
        assert_eq!(
            client.url("languages"),
            "http://localhost:5000/api/languages"
        );
    }
}
