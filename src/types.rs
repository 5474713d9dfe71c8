//! Core types shared by the store, the RPC surface and the client.
//!
//! Everything that crosses the wire is serialized in camelCase.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A task category. Names are stored normalized (see
/// [`crate::db::categories::normalize_category_name`]).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub name: String,
}

/// A task as returned by every read procedure, with its category joined in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub completed: bool,
    /// Sort key. Creation assigns a timestamp-derived value, a full reorder
    /// reassigns dense 1-based positions.
    pub order: f64,
    pub category_id: Option<i64>,
    pub category: Option<Category>,
    /// Creation time in epoch milliseconds.
    pub created_at: i64,
}

impl Task {
    /// Case-insensitive title match. A blank query matches everything.
    pub fn matches_search(&self, query: &str) -> bool {
        let query = query.trim().to_lowercase();
        query.is_empty() || self.title.to_lowercase().contains(&query)
    }
}

/// Tri-state category change for `task.update`.
///
/// On the wire an omitted `categoryId` is `Unchanged`, an explicit `null` is
/// `Cleared` and a number is `Set`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CategoryPatch {
    #[default]
    Unchanged,
    Cleared,
    Set(i64),
}

impl CategoryPatch {
    pub fn is_unchanged(&self) -> bool {
        matches!(self, CategoryPatch::Unchanged)
    }

    /// Resolve the patch against the current value.
    pub fn apply(self, current: Option<i64>) -> Option<i64> {
        match self {
            CategoryPatch::Unchanged => current,
            CategoryPatch::Cleared => None,
            CategoryPatch::Set(id) => Some(id),
        }
    }
}

impl From<Option<i64>> for CategoryPatch {
    fn from(value: Option<i64>) -> Self {
        match value {
            Some(id) => CategoryPatch::Set(id),
            None => CategoryPatch::Cleared,
        }
    }
}

impl Serialize for CategoryPatch {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            // Unchanged is skipped at the field level; if it does reach here
            // it degrades to null.
            CategoryPatch::Unchanged | CategoryPatch::Cleared => serializer.serialize_none(),
            CategoryPatch::Set(id) => serializer.serialize_i64(*id),
        }
    }
}

impl<'de> Deserialize<'de> for CategoryPatch {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        // Only called when the field is present; absence falls back to Default.
        Ok(Option::<i64>::deserialize(deserializer)?.into())
    }
}

/// Input for `task.create`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskInput {
    pub title: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<i64>,
}

/// Input for `task.update`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTaskInput {
    pub id: i64,
    pub title: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "CategoryPatch::is_unchanged")]
    pub category_id: CategoryPatch,
}

/// Input for procedures addressed by task id only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdInput {
    pub id: i64,
}

/// Input for `task.toggleComplete`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToggleCompleteInput {
    pub id: i64,
    pub completed: bool,
}

/// Input for `task.updateOrder`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOrderInput {
    pub ordered_ids: Vec<i64>,
}

/// Input for `task.search`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchInput {
    #[serde(default)]
    pub query: String,
}

/// Input for `category.create`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateCategoryInput {
    pub name: String,
}

/// Output of `task.delete`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteOutput {
    pub success: bool,
    pub deleted_id: i64,
}

/// Output of `task.updateOrder`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuccessOutput {
    pub success: bool,
}
