use serde::{Deserialize, Serialize};

/// What a failed confirmation rolls back to when operations overlap.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RollbackPolicy {
    /// One snapshot per instance, overwritten by every new mutation. A
    /// failure restores the most recently captured snapshot and abandons all
    /// in-flight markers, even when the failing operation started earlier.
    #[default]
    Latest,
    /// One ledger entry per operation on top of the confirmed value. A
    /// failure removes only its own operation; a confirmation updates the
    /// confirmed value and re-applies whatever is still pending. Per key, the
    /// most recently started operation's confirmation wins.
    Isolated,
}

/// Settings shared by cells and collections.
///
/// ```ignore
/// let config = OptimisticConfig::from_json(r#"{ "rollback": "isolated" }"#)?;
/// let tasks = TaskList::builder(vec![]).config(config).build();
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OptimisticConfig {
    pub rollback: RollbackPolicy,
}

impl OptimisticConfig {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn with_rollback(mut self, rollback: RollbackPolicy) -> Self {
        self.rollback = rollback;
        self
    }
}
