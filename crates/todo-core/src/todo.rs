//! The todo resource.
//!
//! There is no storage behind this type: handlers build a fresh record per
//! request and serialize it.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A todo item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Todo {
    /// Numeric identifier
    pub id: i64,

    /// Short title
    pub title: String,

    /// Free-form description
    pub description: String,

    /// Whether the item is done
    pub completed: bool,
}

impl Todo {
    /// Create a new, not yet completed, todo
    #[must_use]
    pub fn new(id: i64, title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            description: description.into(),
            completed: false,
        }
    }

    /// The fixed record served by `GET /api/todos`
    #[must_use]
    pub fn sample() -> Self {
        Self::new(1, "Prueba", "Prueba")
    }
}
