use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[cfg(feature = "sqlx")]
use sqlx::FromRow;

/// Catalog entry for one algorithm topic.
///
/// `resource_count` is denormalized from the number of content rows owned by
/// the algorithm and is recalculated from an actual count on every content
/// create/delete.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(FromRow))]
#[serde(rename_all = "camelCase")]
pub struct Algorithm {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub icon: String,
    pub resource_count: i32,
    pub created_at: DateTime<Utc>,
}

/// Insert payload for an algorithm.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewAlgorithm {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(min = 1, max = 10000))]
    pub description: String,
    pub icon: Option<String>,
}

impl NewAlgorithm {
    /// Default icon matches the front-end's brain glyph.
    pub fn icon_or_default(&self) -> String {
        self.icon
            .clone()
            .unwrap_or_else(|| "fas fa-brain".to_string())
    }
}
