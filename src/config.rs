use std::env;

use anyhow::{Context, Result, bail};

/// Connection settings for the backing service, read once at startup.
/// Every identifier except the API key is required; a missing variable fails
/// here instead of surfacing as a NotFound deep inside an operation.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the service API, including the version segment.
    pub endpoint: String,
    pub project_id: String,
    pub database_id: String,
    pub user_collection_id: String,
    pub post_collection_id: String,
    pub saves_collection_id: String,
    pub stories_collection_id: String,
    pub storage_id: String,
    /// Privileged key, maintenance scripts only.
    pub api_key: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            endpoint: required("APPWRITE_ENDPOINT")?,
            project_id: required("APPWRITE_PROJECT_ID")?,
            database_id: required("APPWRITE_DATABASE_ID")?,
            user_collection_id: required("APPWRITE_USER_COLLECTION_ID")?,
            post_collection_id: required("APPWRITE_POST_COLLECTION_ID")?,
            saves_collection_id: required("APPWRITE_SAVES_COLLECTION_ID")?,
            stories_collection_id: required("APPWRITE_STORIES_COLLECTION_ID")?,
            storage_id: required("APPWRITE_STORAGE_ID")?,
            api_key: env::var("APPWRITE_API_KEY")
                .ok()
                .map(|k| k.trim().to_string())
                .filter(|k| !k.is_empty()),
        })
    }
}

fn required(key: &str) -> Result<String> {
    let value = env::var(key).with_context(|| format!("{key} not set"))?;
    let value = value.trim().to_string();
    if value.is_empty() {
        bail!("{key} is empty");
    }
    Ok(value)
}
