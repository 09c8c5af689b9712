use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Time-boxed content. Visibility is gated by `expires_at`; expired stories
/// are filtered out at read time, never purged.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Story {
    #[serde(rename = "$id")]
    pub id: String,
    #[serde(rename = "$createdAt", default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(deserialize_with = "super::doc_ref::deserialize")]
    pub creator: String,
    #[serde(rename = "imageUrl")]
    pub image_url: String,
    #[serde(rename = "imageId")]
    pub image_id: String,
    #[serde(rename = "expiresAt", default)]
    pub expires_at: Option<DateTime<Utc>>,
}
