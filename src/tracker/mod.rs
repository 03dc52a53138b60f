pub mod linear;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

use crate::model::tracker::{IssueInput, IssueRef, Project, Team};

/// One entry of a GraphQL `errors` array.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ApiError {
    pub message: String,
}

#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("tracker request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("tracker returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("failed to decode tracker response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("{}", first_message(.0))]
    Api(Vec<ApiError>),
    #[error("tracker reported {0} as unsuccessful")]
    Unsuccessful(&'static str),
    #[error("no data in tracker response")]
    MissingData,
}

fn first_message(errors: &[ApiError]) -> String {
    errors
        .first()
        .map(|e| e.message.clone())
        .unwrap_or_else(|| "unknown tracker error".to_string())
}

impl TrackerError {
    #[cfg(test)]
    pub fn api(message: impl Into<String>) -> Self {
        TrackerError::Api(vec![ApiError {
            message: message.into(),
        }])
    }
}

/// The four remote operations the sync run depends on.
#[async_trait]
pub trait Tracker: Send + Sync {
    fn name(&self) -> &str;
    async fn list_teams(&self) -> Result<Vec<Team>, TrackerError>;
    async fn list_projects(&self, team_id: &str) -> Result<Vec<Project>, TrackerError>;
    async fn create_project(&self, name: &str, team_id: &str) -> Result<Project, TrackerError>;
    async fn create_issue(&self, input: &IssueInput) -> Result<IssueRef, TrackerError>;
}
