use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", from = "String")]
pub enum TaskStatus {
    #[default]
    Open,
    InProgress,
    Blocked,
    Closed,
}

impl TaskStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::Open => "open",
            TaskStatus::InProgress => "in_progress",
            TaskStatus::Blocked => "blocked",
            TaskStatus::Closed => "closed",
        }
    }

    /// Unknown statuses fall back to `Open` so they still show up somewhere.
    pub fn parse(s: &str) -> Self {
        match s {
            "in_progress" => TaskStatus::InProgress,
            "blocked" => TaskStatus::Blocked,
            "closed" => TaskStatus::Closed,
            _ => TaskStatus::Open,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            TaskStatus::Open => "○",
            TaskStatus::InProgress => "◐",
            TaskStatus::Blocked => "⊘",
            TaskStatus::Closed => "●",
        }
    }
}

impl From<String> for TaskStatus {
    fn from(s: String) -> Self {
        TaskStatus::parse(&s)
    }
}

/// A directed relation between two issues as reported by `bd list --json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    pub issue_id: String,
    pub depends_on_id: String,
    #[serde(rename = "type")]
    pub dep_type: String,
}

impl Dependency {
    /// Matches both `"parent-child"` and the older `"parent"` spelling.
    pub fn is_parent_child(&self) -> bool {
        self.dep_type.starts_with("parent")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub design: String,
    #[serde(default)]
    pub acceptance_criteria: String,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default)]
    pub priority: u8,
    #[serde(rename = "issue_type", default)]
    pub issue_type: String,
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub assignee: String,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub closed_at: Option<String>,
    #[serde(default)]
    pub blocked_by: Vec<String>,
    #[serde(default)]
    pub blocks: Vec<String>,
    #[serde(default)]
    pub dependencies: Vec<Dependency>,
}

impl Task {
    pub fn priority_label(&self) -> &'static str {
        match self.priority {
            0 => "P0",
            1 => "P1",
            2 => "P2",
            3 => "P3",
            4 => "P4",
            _ => "P?",
        }
    }

    pub fn is_blocked(&self) -> bool {
        !self.blocked_by.is_empty()
    }

    /// Explicit parent-child dependencies win; otherwise fall back to the
    /// dotted ID convention (`bd-42.1` is a child of `bd-42`).
    pub fn parent_id(&self) -> Option<String> {
        self.dependencies
            .iter()
            .find(|d| d.is_parent_child())
            .map(|d| d.depends_on_id.clone())
            .or_else(|| parent_from_id(&self.id))
    }
}

/// Derive a parent ID from dot notation. `bd-42.1.3` → `bd-42.1`.
pub fn parent_from_id(id: &str) -> Option<String> {
    let (parent, child) = id.rsplit_once('.')?;
    if parent.is_empty() || child.is_empty() || !child.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    Some(parent.to_string())
}

/// Sparse update: only `Some` fields are sent to the tracker.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<u8>,
    pub issue_type: Option<String>,
    pub description: Option<String>,
    pub notes: Option<String>,
}

impl TaskPatch {
    pub fn is_empty(&self) -> bool {
        *self == TaskPatch::default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    pub title: String,
    pub description: String,
    pub priority: u8,
    pub issue_type: String,
}
