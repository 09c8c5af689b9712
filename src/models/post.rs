use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    #[serde(rename = "$id")]
    pub id: String,
    #[serde(rename = "$createdAt")]
    pub created_at: DateTime<Utc>,
    #[serde(rename = "$updatedAt")]
    pub updated_at: DateTime<Utc>,
    #[serde(deserialize_with = "super::doc_ref::deserialize")]
    pub creator: String,
    pub caption: String,
    #[serde(rename = "imageUrl")]
    pub image_url: String,
    #[serde(rename = "imageId")]
    pub image_id: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Identities of users who liked this post. The full set is replaced on
    /// every like/unlike; last writer wins.
    #[serde(default, deserialize_with = "super::doc_ref::deserialize_vec")]
    pub likes: Vec<String>,
    /// Fixed at creation to creation time + 24h. Advisory for posts, a hard
    /// visibility cutoff for stories. Absent only on legacy documents that
    /// predate the attribute.
    #[serde(rename = "expiresAt", default)]
    pub expires_at: Option<DateTime<Utc>>,
}

/// Join record linking a user to a saved post. Uniqueness of (user, post) is
/// best-effort; duplicates are tolerated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SavedPost {
    #[serde(rename = "$id")]
    pub id: String,
    #[serde(rename = "user", default, deserialize_with = "super::doc_ref::deserialize_opt")]
    pub user_id: Option<String>,
    #[serde(rename = "post", deserialize_with = "super::doc_ref::deserialize")]
    pub post_id: String,
}
