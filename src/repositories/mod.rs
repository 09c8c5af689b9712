pub mod appwrite_repo;
pub mod query;

#[cfg(test)]
pub(crate) mod fake_repo;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use crate::dtos::FilePayload;
use crate::error::Result;
use query::Query;

pub use appwrite_repo::AppwriteRepo;

/// Preview sizing applied to every uploaded image.
pub const PREVIEW_WIDTH: u32 = 2000;
pub const PREVIEW_HEIGHT: u32 = 2000;
pub const PREVIEW_GRAVITY: &str = "top";
pub const PREVIEW_QUALITY: u8 = 100;

/// One page of raw documents as returned by the store's list endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct DocumentPage {
    pub total: u64,
    pub documents: Vec<Value>,
}

/// Reference to a stored binary object.
#[derive(Debug, Clone, Deserialize)]
pub struct FileRef {
    #[serde(rename = "$id")]
    pub id: String,
}

/// Auth identity as known to the backing service.
#[derive(Debug, Clone, Deserialize)]
pub struct Account {
    #[serde(rename = "$id")]
    pub id: String,
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Session {
    #[serde(rename = "$id")]
    pub id: String,
    #[serde(rename = "userId")]
    pub user_id: String,
    #[serde(default)]
    pub secret: String,
}

/// Boundary to the backing document/file/session service. Every method is a
/// single-attempt pass-through; there is no retry policy anywhere.
#[async_trait]
pub trait Gateway: Send + Sync {
    async fn create_document(&self, collection_id: &str, data: Value) -> Result<Value>;
    async fn get_document(&self, collection_id: &str, document_id: &str) -> Result<Value>;
    async fn update_document(&self, collection_id: &str, document_id: &str, data: Value)
    -> Result<Value>;
    async fn delete_document(&self, collection_id: &str, document_id: &str) -> Result<()>;
    async fn list_documents(&self, collection_id: &str, queries: &[Query]) -> Result<DocumentPage>;

    async fn upload_file(&self, file: &FilePayload) -> Result<FileRef>;
    /// Preview URL for a stored file at the fixed sizing above. Constructed
    /// locally; failure still triggers upload compensation in callers.
    fn file_preview_url(&self, file_id: &str) -> Result<String>;
    async fn delete_file(&self, file_id: &str) -> Result<()>;

    async fn create_account(&self, email: &str, password: &str, name: &str) -> Result<Account>;
    async fn create_email_session(&self, email: &str, password: &str) -> Result<Session>;
    async fn get_account(&self) -> Result<Account>;
    async fn delete_session(&self) -> Result<()>;
    /// Initials-based avatar URL for a display name.
    fn initials_avatar_url(&self, name: &str) -> Result<String>;
}
