use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[cfg(feature = "sqlx")]
use sqlx::FromRow;

/// Portfolio project shown on the site.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(FromRow))]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub category: String,
    pub year: String,
    pub tags: Vec<String>,
    pub image_url: Option<String>,
    pub project_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Insert payload for a project.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct NewProject {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(min = 1, max = 10000))]
    pub description: String,
    #[validate(length(min = 1, max = 100))]
    pub category: String,
    #[validate(length(min = 1, max = 10))]
    pub year: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[validate(url)]
    pub image_url: Option<String>,
    #[validate(url)]
    pub project_url: Option<String>,
}
