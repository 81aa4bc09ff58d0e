use serde::{Deserialize, Serialize};

/// Per-user preferences loaded from `.checklist/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalConfig {
    /// Ask before deleting a task.
    #[serde(default = "default_confirm_delete")]
    pub confirm_delete: bool,
    /// Show the numeric task id in front of each row.
    #[serde(default)]
    pub show_ids: bool,
}

fn default_confirm_delete() -> bool {
    true
}

impl Default for LocalConfig {
    fn default() -> Self {
        Self {
            confirm_delete: default_confirm_delete(),
            show_ids: false,
        }
    }
}
