use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::post::SavedPost;

/// Profile document from the users collection. `account_id` ties the profile
/// to the auth identity; `saves` carries the user's save-records so unsave can
/// resolve which record to delete.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "$id")]
    pub id: String,
    #[serde(rename = "$createdAt", default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(rename = "accountId")]
    pub account_id: String,
    pub name: String,
    #[serde(default)]
    pub username: Option<String>,
    pub email: String,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(rename = "imageUrl")]
    pub image_url: String,
    #[serde(rename = "imageId", default)]
    pub image_id: Option<String>,
    #[serde(rename = "save", default)]
    pub saves: Vec<SavedPost>,
    /// Post ids this user has liked, derived from post like-sets.
    #[serde(default, deserialize_with = "super::doc_ref::deserialize_vec")]
    pub liked: Vec<String>,
}

impl User {
    /// Save-record id for a post, if this user has saved it.
    pub fn save_record_for(&self, post_id: &str) -> Option<&str> {
        self.saves
            .iter()
            .find(|record| record.post_id == post_id)
            .map(|record| record.id.as_str())
    }
}
