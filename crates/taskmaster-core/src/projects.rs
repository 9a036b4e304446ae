//! Project resource: model types and the CRUD gateway.

use chrono::{DateTime, NaiveDate};
use reqwest::Method;
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, ApiResult, ValidationError};
use crate::http::HttpClient;

const PROJECTS_PATH: &str = "/api/v1/projects/";

/// Server-assigned project identifier.
pub type ProjectId = i64;

/// A project as returned by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: ProjectId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<i64>,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
}

impl Project {
    /// Calendar date of `created_at`, if it is a valid RFC 3339 timestamp.
    pub fn created_date(&self) -> Option<NaiveDate> {
        DateTime::parse_from_rfc3339(&self.created_at)
            .ok()
            .map(|ts| ts.date_naive())
    }

    /// Draft prefilled from this project, for the edit form.
    pub fn to_draft(&self) -> ProjectDraft {
        ProjectDraft {
            name: self.name.clone(),
            description: self.description.clone(),
        }
    }
}

/// Projects in server order, as last returned by `list`.
pub type ProjectList = Vec<Project>;

/// Body of create and update requests.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProjectDraft {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ProjectDraft {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
        }
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// # Errors
    /// Returns a `ValidationError` when the name is blank.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::new("name", "project name is required"));
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct ProjectsResponse {
    #[serde(default)]
    projects: Vec<Project>,
}

#[derive(Debug, Deserialize)]
struct ProjectResponse {
    project: Project,
}

/// CRUD operations against `/api/v1/projects`. Holds no cached state.
#[derive(Debug, Clone)]
pub struct ProjectGateway {
    client: HttpClient,
}

impl ProjectGateway {
    pub fn new(client: HttpClient) -> Self {
        Self { client }
    }

    /// # Errors
    /// Any error from the HTTP adapter.
    pub async fn list(&self) -> ApiResult<ProjectList> {
        let response: ProjectsResponse = self
            .client
            .send_json(Method::GET, PROJECTS_PATH, None)
            .await?;
        Ok(response.projects)
    }

    /// # Errors
    /// Any error from the HTTP adapter; unknown ids surface as `Server`.
    pub async fn get(&self, id: ProjectId) -> ApiResult<Project> {
        let response: ProjectResponse = self
            .client
            .send_json(Method::GET, &project_path(id), None)
            .await?;
        Ok(response.project)
    }

    /// # Errors
    /// `Validation` for an invalid draft (no request is made); otherwise any
    /// error from the HTTP adapter.
    pub async fn create(&self, draft: &ProjectDraft) -> ApiResult<Project> {
        draft.validate()?;
        let body = to_body(draft)?;
        let response: ProjectResponse = self
            .client
            .send_json(Method::POST, PROJECTS_PATH, Some(&body))
            .await?;
        Ok(response.project)
    }

    /// # Errors
    /// Same as [`ProjectGateway::create`].
    pub async fn update(&self, id: ProjectId, draft: &ProjectDraft) -> ApiResult<Project> {
        draft.validate()?;
        let body = to_body(draft)?;
        let response: ProjectResponse = self
            .client
            .send_json(Method::PUT, &project_path(id), Some(&body))
            .await?;
        Ok(response.project)
    }

    /// # Errors
    /// Any error from the HTTP adapter; unknown ids surface as `Server`.
    pub async fn delete(&self, id: ProjectId) -> ApiResult<()> {
        self.client
            .send(Method::DELETE, &project_path(id), None)
            .await?;
        Ok(())
    }
}

fn project_path(id: ProjectId) -> String {
    format!("{PROJECTS_PATH}{id}")
}

fn to_body(draft: &ProjectDraft) -> ApiResult<serde_json::Value> {
    serde_json::to_value(draft).map_err(|e| ApiError::Decode(e.to_string()))
}
