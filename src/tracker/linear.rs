use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{ApiError, Tracker, TrackerError};
use crate::model::tracker::{IssueInput, IssueRef, Project, Team};

pub const DEFAULT_API_URL: &str = "https://api.linear.app/graphql";

pub struct LinearClient {
    api_key: String,
    api_url: String,
    client: reqwest::Client,
}

impl LinearClient {
    pub fn new(api_key: String, api_url: Option<String>) -> Self {
        Self {
            api_key,
            api_url: api_url.unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            client: reqwest::Client::new(),
        }
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        query: &str,
        variables: serde_json::Value,
    ) -> Result<T, TrackerError> {
        let body = GqlRequest { query, variables };
        let resp = self
            .client
            .post(&self.api_url)
            .header("Authorization", &self.api_key)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        let text = resp.text().await?;
        debug!(status = status.as_u16(), bytes = text.len(), "linear response");
        decode_response(status.as_u16(), &text)
    }
}

const TEAMS_QUERY: &str = r#"query {
  teams {
    nodes { id name key }
  }
}"#;

const PROJECTS_QUERY: &str = r#"query ($teamId: String!) {
  projects(filter: { team: { id: { eq: $teamId } } }) {
    nodes { id name state }
  }
}"#;

const PROJECT_CREATE_MUTATION: &str = r#"mutation ($input: ProjectCreateInput!) {
  projectCreate(input: $input) {
    success
    project { id name }
  }
}"#;

const ISSUE_CREATE_MUTATION: &str = r#"mutation ($input: IssueCreateInput!) {
  issueCreate(input: $input) {
    success
    issue { id title url }
  }
}"#;

#[derive(Serialize)]
struct GqlRequest<'a> {
    query: &'a str,
    variables: serde_json::Value,
}

#[derive(Deserialize)]
struct GqlResponse<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Vec<ApiError>,
}

#[derive(Deserialize)]
struct Connection<T> {
    nodes: Vec<T>,
}

#[derive(Deserialize)]
struct TeamsData {
    teams: Connection<Team>,
}

#[derive(Deserialize)]
struct ProjectsData {
    projects: Connection<Project>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProjectCreateData {
    project_create: ProjectPayload,
}

#[derive(Deserialize)]
struct ProjectPayload {
    success: bool,
    project: Option<Project>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct IssueCreateData {
    issue_create: IssuePayload,
}

#[derive(Deserialize)]
struct IssuePayload {
    success: bool,
    issue: Option<IssueRef>,
}

/// A GraphQL `errors` array means failure whatever the HTTP status says.
fn decode_response<T: DeserializeOwned>(status: u16, body: &str) -> Result<T, TrackerError> {
    let gql: GqlResponse<T> = match serde_json::from_str(body) {
        Ok(gql) => gql,
        Err(_) if !(200..300).contains(&status) => {
            return Err(TrackerError::Status {
                status,
                body: body.chars().take(500).collect(),
            });
        }
        Err(e) => return Err(TrackerError::Decode(e)),
    };
    if !gql.errors.is_empty() {
        return Err(TrackerError::Api(gql.errors));
    }
    gql.data.ok_or(TrackerError::MissingData)
}

fn created<T>(success: bool, payload: Option<T>, what: &'static str) -> Result<T, TrackerError> {
    match (success, payload) {
        (true, Some(p)) => Ok(p),
        _ => Err(TrackerError::Unsuccessful(what)),
    }
}

#[async_trait]
impl Tracker for LinearClient {
    fn name(&self) -> &str {
        "Linear"
    }

    async fn list_teams(&self) -> Result<Vec<Team>, TrackerError> {
        let data: TeamsData = self.execute(TEAMS_QUERY, serde_json::json!({})).await?;
        Ok(data.teams.nodes)
    }

    async fn list_projects(&self, team_id: &str) -> Result<Vec<Project>, TrackerError> {
        let data: ProjectsData = self
            .execute(PROJECTS_QUERY, serde_json::json!({ "teamId": team_id }))
            .await?;
        Ok(data.projects.nodes)
    }

    async fn create_project(&self, name: &str, team_id: &str) -> Result<Project, TrackerError> {
        let variables = serde_json::json!({
            "input": { "name": name, "teamIds": [team_id] }
        });
        let data: ProjectCreateData = self.execute(PROJECT_CREATE_MUTATION, variables).await?;
        let payload = data.project_create;
        created(payload.success, payload.project, "projectCreate")
    }

    async fn create_issue(&self, input: &IssueInput) -> Result<IssueRef, TrackerError> {
        let variables = serde_json::json!({ "input": input });
        let data: IssueCreateData = self.execute(ISSUE_CREATE_MUTATION, variables).await?;
        let payload = data.issue_create;
        created(payload.success, payload.issue, "issueCreate")
    }
}
