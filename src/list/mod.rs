pub mod storage;

use chrono::{DateTime, Utc};
use fuzzy_matcher::skim::SkimMatcherV2;
use fuzzy_matcher::FuzzyMatcher;
use serde::{Deserialize, Serialize};

/// Which subset of tasks is displayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Filter {
    #[default]
    All,
    Active,
    Completed,
}

impl Filter {
    pub fn cycle(self) -> Self {
        match self {
            Self::All => Self::Active,
            Self::Active => Self::Completed,
            Self::Completed => Self::All,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Active => "active",
            Self::Completed => "completed",
        }
    }

    /// Whether a task belongs to this filter's subset.
    pub fn matches(&self, task: &Task) -> bool {
        match self {
            Self::All => true,
            Self::Active => !task.done,
            Self::Completed => task.done,
        }
    }
}

impl std::str::FromStr for Filter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "all" => Ok(Self::All),
            "active" => Ok(Self::Active),
            "completed" | "done" => Ok(Self::Completed),
            other => Err(format!("unknown filter '{other}': use all, active, completed")),
        }
    }
}

impl std::fmt::Display for Filter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Optional alphabetical ordering overlay on the filtered view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortMode {
    #[default]
    None,
    Ascending,
    Descending,
}

impl SortMode {
    pub fn cycle(self) -> Self {
        match self {
            Self::None => Self::Ascending,
            Self::Ascending => Self::Descending,
            Self::Descending => Self::None,
        }
    }

    /// Glyph shown in the status bar; empty when sorting is off.
    pub fn indicator(&self) -> &'static str {
        match self {
            Self::None => "",
            Self::Ascending => "↑",
            Self::Descending => "↓",
        }
    }
}

/// A single checklist entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Task {
    pub id: u64,
    pub text: String,
    pub done: bool,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
}

impl Task {
    pub fn new(id: u64, text: String) -> Self {
        let now = Utc::now();
        Self {
            id,
            text,
            done: false,
            created: now,
            updated: now,
        }
    }

    /// Bump the `updated` timestamp.
    pub fn touch(&mut self) {
        self.updated = Utc::now();
    }
}

/// The authoritative task collection plus its id counter.
///
/// Insertion order of `tasks` is the source of truth; filtering and sorting
/// are derived views that never reorder this collection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Checklist {
    pub next_id: u64,
    #[serde(default)]
    pub tasks: Vec<Task>,
}

impl Checklist {
    pub fn new() -> Self {
        Self::default()
    }

    /// Generate the next task id and increment the counter.
    fn fresh_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    pub fn find(&self, id: u64) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    fn find_mut(&mut self, id: u64) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|t| t.id == id)
    }

    /// Append a new task. Whitespace-only input is silently ignored.
    /// Returns the new task's id when one was created.
    pub fn add(&mut self, raw: &str) -> Option<u64> {
        let text = raw.trim();
        if text.is_empty() {
            return None;
        }
        let id = self.fresh_id();
        self.tasks.push(Task::new(id, text.to_string()));
        Some(id)
    }

    /// Flip the done flag of the task with the given id.
    pub fn toggle(&mut self, id: u64) -> bool {
        match self.find_mut(id) {
            Some(task) => {
                task.done = !task.done;
                task.touch();
                true
            }
            None => false,
        }
    }

    /// Remove the task with the given id, returning it.
    pub fn remove(&mut self, id: u64) -> Option<Task> {
        let idx = self.tasks.iter().position(|t| t.id == id)?;
        Some(self.tasks.remove(idx))
    }

    /// Replace a task's text. An empty or unchanged (post-trim) replacement
    /// is silently discarded.
    pub fn rename(&mut self, id: u64, raw: &str) -> bool {
        let text = raw.trim();
        if text.is_empty() {
            return false;
        }
        match self.find_mut(id) {
            Some(task) if task.text != text => {
                task.text = text.to_string();
                task.touch();
                true
            }
            _ => false,
        }
    }

    pub fn active_count(&self) -> usize {
        self.tasks.iter().filter(|t| !t.done).count()
    }

    pub fn completed_count(&self) -> usize {
        self.tasks.iter().filter(|t| t.done).count()
    }

    /// Derive the visible projection: filter first (membership), then the
    /// optional alphabetical sort (order only). The query is a fuzzy text
    /// filter applied together with the mode filter.
    pub fn visible(
        &self,
        filter: Filter,
        sort: SortMode,
        query: Option<&str>,
        matcher: &SkimMatcherV2,
    ) -> Vec<&Task> {
        let mut view: Vec<&Task> = self
            .tasks
            .iter()
            .filter(|t| task_is_visible(t, filter, query, matcher))
            .collect();

        match sort {
            SortMode::None => {}
            SortMode::Ascending => {
                view.sort_by(|a, b| a.text.to_lowercase().cmp(&b.text.to_lowercase()));
            }
            SortMode::Descending => {
                view.sort_by(|a, b| b.text.to_lowercase().cmp(&a.text.to_lowercase()));
            }
        }

        view
    }
}

/// Whether a task passes the mode filter and the optional text query.
pub fn task_is_visible(
    task: &Task,
    filter: Filter,
    query: Option<&str>,
    matcher: &SkimMatcherV2,
) -> bool {
    if !filter.matches(task) {
        return false;
    }
    match query {
        Some(q) if !q.is_empty() => matcher.fuzzy_match(&task.text, q).is_some(),
        _ => true,
    }
}
