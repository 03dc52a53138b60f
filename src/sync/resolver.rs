use std::collections::{HashMap, HashSet};

use tracing::{debug, info, warn};

use super::SyncEvent;
use crate::tracker::Tracker;

/// Project name to id mapping for a single run.
///
/// `existing` holds what the tracker already had when the run started;
/// `created` holds projects made during this run and `failed` the names whose
/// creation was rejected. Nothing here outlives the run.
#[derive(Debug, Default)]
pub struct ProjectCache {
    existing: HashMap<String, String>,
    created: HashMap<String, String>,
    failed: HashSet<String>,
}

impl ProjectCache {
    pub fn new(existing: HashMap<String, String>) -> Self {
        Self {
            existing,
            created: HashMap::new(),
            failed: HashSet::new(),
        }
    }

    /// Pre-fetch the team's projects. A failed listing leaves the cache empty.
    pub async fn load(
        tracker: &dyn Tracker,
        team_id: &str,
        on_event: &mut dyn FnMut(&SyncEvent),
    ) -> Self {
        match tracker.list_projects(team_id).await {
            Ok(projects) => {
                for p in &projects {
                    debug!(project = %p.name, state = ?p.state, "existing project");
                }
                let existing: HashMap<String, String> =
                    projects.into_iter().map(|p| (p.name, p.id)).collect();
                on_event(&SyncEvent::ProjectsLoaded {
                    count: existing.len(),
                });
                Self::new(existing)
            }
            Err(e) => {
                warn!(team_id, error = %e, "could not list projects");
                on_event(&SyncEvent::ProjectsUnavailable {
                    message: e.to_string(),
                });
                Self::default()
            }
        }
    }

    pub fn lookup(&self, name: &str) -> Option<&str> {
        self.existing
            .get(name)
            .or_else(|| self.created.get(name))
            .map(String::as_str)
    }

    pub fn created(&self) -> &HashMap<String, String> {
        &self.created
    }

    /// Existing projects first, then this run's creations, then create it.
    /// Each name is sent to `create_project` at most once per run; a failed
    /// creation yields `None` for that name from then on.
    pub async fn resolve(
        &mut self,
        tracker: &dyn Tracker,
        name: &str,
        team_id: &str,
        on_event: &mut dyn FnMut(&SyncEvent),
    ) -> Option<String> {
        if let Some(id) = self.lookup(name) {
            return Some(id.to_string());
        }
        if self.failed.contains(name) {
            debug!(project = name, "skipping project that failed earlier");
            return None;
        }

        on_event(&SyncEvent::CreatingProject {
            name: name.to_string(),
        });
        match tracker.create_project(name, team_id).await {
            Ok(project) => {
                info!(project = name, id = %project.id, "created project");
                self.created.insert(name.to_string(), project.id.clone());
                on_event(&SyncEvent::ProjectCreated {
                    name: name.to_string(),
                    id: project.id.clone(),
                });
                Some(project.id)
            }
            Err(e) => {
                warn!(project = name, error = %e, "project creation failed");
                self.failed.insert(name.to_string());
                on_event(&SyncEvent::ProjectFailed {
                    name: name.to_string(),
                    message: e.to_string(),
                });
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracker::tests::{Call, FakeTracker};

    fn ignore(_: &SyncEvent) {}

    #[tokio::test]
    async fn load_maps_existing_projects() {
        let tracker = FakeTracker::new()
            .with_project("p1", "Backend API")
            .with_project("p2", "App Mobile");
        let mut events = Vec::new();
        let cache = ProjectCache::load(&tracker, "team-1", &mut |e| events.push(e.clone())).await;

        assert_eq!(cache.lookup("Backend API"), Some("p1"));
        assert_eq!(cache.lookup("App Mobile"), Some("p2"));
        assert_eq!(events, vec![SyncEvent::ProjectsLoaded { count: 2 }]);
    }

    #[tokio::test]
    async fn failed_listing_yields_empty_cache() {
        let tracker = FakeTracker::new()
            .with_project("p1", "Backend API")
            .failing_project_list();
        let mut events = Vec::new();
        let cache = ProjectCache::load(&tracker, "team-1", &mut |e| events.push(e.clone())).await;

        assert_eq!(cache.lookup("Backend API"), None);
        assert!(matches!(events[0], SyncEvent::ProjectsUnavailable { .. }));
    }

    #[tokio::test]
    async fn existing_project_is_not_recreated() {
        let tracker = FakeTracker::new();
        let mut cache = ProjectCache::new(HashMap::from([("Web".to_string(), "p1".to_string())]));

        let id = cache.resolve(&tracker, "Web", "team-1", &mut ignore).await;
        assert_eq!(id.as_deref(), Some("p1"));
        assert!(tracker.calls().is_empty());
    }

    #[tokio::test]
    async fn same_name_is_created_once_per_run() {
        let tracker = FakeTracker::new();
        let mut cache = ProjectCache::default();

        let first = cache.resolve(&tracker, "Web", "team-1", &mut ignore).await;
        let second = cache.resolve(&tracker, "Web", "team-1", &mut ignore).await;

        assert!(first.is_some());
        assert_eq!(first, second);
        assert_eq!(tracker.project_creations(), vec!["Web"]);
        assert_eq!(cache.created().len(), 1);
    }

    #[tokio::test]
    async fn lookup_is_exact_on_name() {
        let tracker = FakeTracker::new();
        let mut cache = ProjectCache::new(HashMap::from([("Web".to_string(), "p1".to_string())]));

        cache.resolve(&tracker, "web", "team-1", &mut ignore).await;
        assert_eq!(tracker.calls(), vec![Call::CreateProject("web".into())]);
    }

    #[tokio::test]
    async fn failed_creation_returns_none_and_reports() {
        let tracker = FakeTracker::new().failing_project("Web");
        let mut cache = ProjectCache::default();
        let mut events = Vec::new();

        let id = cache
            .resolve(&tracker, "Web", "team-1", &mut |e| events.push(e.clone()))
            .await;

        assert_eq!(id, None);
        assert!(cache.created().is_empty());
        assert_eq!(
            events,
            vec![
                SyncEvent::CreatingProject { name: "Web".into() },
                SyncEvent::ProjectFailed {
                    name: "Web".into(),
                    message: "cannot create Web".into()
                },
            ]
        );
    }

    #[tokio::test]
    async fn failed_name_is_not_sent_again() {
        let tracker = FakeTracker::new().failing_project("Web");
        let mut cache = ProjectCache::default();
        let mut events = Vec::new();

        let first = cache
            .resolve(&tracker, "Web", "team-1", &mut |e| events.push(e.clone()))
            .await;
        let second = cache
            .resolve(&tracker, "Web", "team-1", &mut |e| events.push(e.clone()))
            .await;

        assert_eq!((first, second), (None, None));
        assert_eq!(tracker.calls(), vec![Call::CreateProject("Web".into())]);
        assert_eq!(events.len(), 2);
    }

    #[tokio::test]
    async fn failure_does_not_block_other_names() {
        let tracker = FakeTracker::new().failing_project("Web");
        let mut cache = ProjectCache::default();

        cache.resolve(&tracker, "Web", "team-1", &mut ignore).await;
        let api = cache.resolve(&tracker, "Api", "team-1", &mut ignore).await;

        assert!(api.is_some());
        assert_eq!(tracker.project_creations(), vec!["Web", "Api"]);
    }
}
