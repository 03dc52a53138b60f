use serde::{Deserialize, Serialize};

pub const DEFAULT_PROJECT: &str = "General";
pub const MAX_TITLE_CHARS: usize = 70;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

impl Priority {
    /// Fixed ordering; the tracker's wire value is the 1-based position in this list.
    pub const ALL: [Priority; 4] = [
        Priority::Low,
        Priority::Medium,
        Priority::High,
        Priority::Urgent,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
            Priority::Urgent => "urgent",
        }
    }

    pub fn ordinal(self) -> u8 {
        match self {
            Priority::Low => 1,
            Priority::Medium => 2,
            Priority::High => 3,
            Priority::Urgent => 4,
        }
    }

    /// Case-insensitive exact match against the four known values.
    pub fn from_token(token: &str) -> Option<Priority> {
        Priority::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(token))
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One unit of work extracted from the structured text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskRecord {
    pub title: String,
    pub description: String,
    pub priority: Priority,
    #[serde(default)]
    pub tags: Vec<String>,
    pub project: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordinal_follows_fixed_order() {
        assert_eq!(Priority::Low.ordinal(), 1);
        assert_eq!(Priority::Medium.ordinal(), 2);
        assert_eq!(Priority::High.ordinal(), 3);
        assert_eq!(Priority::Urgent.ordinal(), 4);

        for (i, p) in Priority::ALL.iter().enumerate() {
            assert_eq!(p.ordinal() as usize, i + 1);
        }
    }

    #[test]
    fn from_token_ignores_case() {
        assert_eq!(Priority::from_token("URGENT"), Some(Priority::Urgent));
        assert_eq!(Priority::from_token("High"), Some(Priority::High));
        assert_eq!(Priority::from_token("low"), Some(Priority::Low));
    }

    #[test]
    fn from_token_rejects_unknown_values() {
        assert_eq!(Priority::from_token("critical"), None);
        assert_eq!(Priority::from_token("highest"), None);
        assert_eq!(Priority::from_token(""), None);
    }

    #[test]
    fn default_is_medium() {
        assert_eq!(Priority::default(), Priority::Medium);
    }

    #[test]
    fn task_serializes_priority_lowercase() {
        let task = TaskRecord {
            title: "Fix login bug".into(),
            description: String::new(),
            priority: Priority::Urgent,
            tags: vec!["auth".into()],
            project: DEFAULT_PROJECT.into(),
        };
        let json = serde_json::to_string(&task).unwrap();
        assert!(json.contains(r#""priority":"urgent""#));
    }
}
