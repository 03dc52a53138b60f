pub mod resolver;

use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::model::task::TaskRecord;
use crate::model::tracker::{IssueInput, IssueRef};
use crate::tracker::Tracker;
use resolver::ProjectCache;

/// Progress notifications, emitted in run order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SyncEvent {
    ProjectsLoaded {
        count: usize,
    },
    ProjectsUnavailable {
        message: String,
    },
    CreatingProject {
        name: String,
    },
    ProjectCreated {
        name: String,
        id: String,
    },
    ProjectFailed {
        name: String,
        message: String,
    },
    CreatingIssue {
        index: usize,
        total: usize,
        title: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        project: Option<String>,
    },
    IssueCreated {
        index: usize,
        issue: IssueRef,
    },
    IssueFailed {
        index: usize,
        title: String,
        message: String,
    },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SyncError {
    #[error("no tasks to synchronize")]
    NoTasks,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ItemOutcome {
    Created(IssueRef),
    Failed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SyncOutcome {
    pub title: String,
    pub outcome: ItemOutcome,
}

#[derive(Debug, Default)]
pub struct SyncSummary {
    pub outcomes: Vec<SyncOutcome>,
}

impl SyncSummary {
    pub fn attempted(&self) -> usize {
        self.outcomes.len()
    }

    pub fn created(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.outcome, ItemOutcome::Created(_)))
            .count()
    }

    pub fn failures(&self) -> impl Iterator<Item = (&str, &str)> {
        self.outcomes.iter().filter_map(|o| match &o.outcome {
            ItemOutcome::Failed(message) => Some((o.title.as_str(), message.as_str())),
            ItemOutcome::Created(_) => None,
        })
    }
}

/// Build the `issueCreate` input for one task.
pub fn issue_input(task: &TaskRecord, team_id: &str, project_id: Option<String>) -> IssueInput {
    IssueInput {
        team_id: team_id.to_string(),
        title: task.title.clone(),
        description: task.description.clone(),
        priority: task.priority.ordinal(),
        label_ids: Vec::new(),
        project_id,
    }
}

/// Create every task as an issue in `team_id`, creating missing projects on the way.
///
/// Nothing is sent to the tracker when `tasks` is empty.
pub async fn sync_tasks(
    tracker: &dyn Tracker,
    team_id: &str,
    tasks: &[TaskRecord],
    on_event: &mut dyn FnMut(&SyncEvent),
) -> Result<SyncSummary, SyncError> {
    if tasks.is_empty() {
        return Err(SyncError::NoTasks);
    }
    let mut cache = ProjectCache::load(tracker, team_id, on_event).await;
    Ok(sync_with_cache(tracker, &mut cache, team_id, tasks, on_event).await)
}

/// Strictly sequential: project dedup relies on each resolution finishing
/// before the next one reads the cache.
pub async fn sync_with_cache(
    tracker: &dyn Tracker,
    cache: &mut ProjectCache,
    team_id: &str,
    tasks: &[TaskRecord],
    on_event: &mut dyn FnMut(&SyncEvent),
) -> SyncSummary {
    let total = tasks.len();
    let mut summary = SyncSummary::default();

    for (i, task) in tasks.iter().enumerate() {
        let index = i + 1;
        let project_id = cache
            .resolve(tracker, &task.project, team_id, on_event)
            .await;

        on_event(&SyncEvent::CreatingIssue {
            index,
            total,
            title: task.title.clone(),
            project: project_id.as_ref().map(|_| task.project.clone()),
        });

        let input = issue_input(task, team_id, project_id);
        let outcome = match tracker.create_issue(&input).await {
            Ok(issue) => {
                info!(index, id = %issue.id, "created issue");
                on_event(&SyncEvent::IssueCreated {
                    index,
                    issue: issue.clone(),
                });
                ItemOutcome::Created(issue)
            }
            Err(e) => {
                warn!(index, title = %task.title, error = %e, "issue creation failed");
                on_event(&SyncEvent::IssueFailed {
                    index,
                    title: task.title.clone(),
                    message: e.to_string(),
                });
                ItemOutcome::Failed(e.to_string())
            }
        };

        summary.outcomes.push(SyncOutcome {
            title: task.title.clone(),
            outcome,
        });
    }

    info!(
        created = summary.created(),
        attempted = summary.attempted(),
        projects_created = cache.created().len(),
        "sync finished"
    );
    summary
}
