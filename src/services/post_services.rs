use std::sync::Arc;

use chrono::Utc;
use log::warn;
use serde_json::json;

use crate::config::Config;
use crate::dtos::{FilePayload, NewPost, UpdatePost};
use crate::error::{Error, Result, log_err};
use crate::models::{Post, SavedPost};
use crate::repositories::{Gateway, query::Query};

use super::story_services::expires_at;

/// Fixed page size of the cursor-based feed.
pub const FEED_PAGE_SIZE: u32 = 9;
/// Cap of the no-paging "recent posts" listing.
pub const RECENT_POSTS_LIMIT: u32 = 20;

/// One page of a forward-only cursor feed.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub total: u64,
    pub items: Vec<T>,
}

impl Page<Post> {
    /// Cursor for the next page: the id of this page's last item.
    pub fn next_cursor(&self) -> Option<&str> {
        self.items.last().map(|post| post.id.as_str())
    }
}

/// Derive a tag set from a comma-separated string; all whitespace is
/// stripped, empty segments dropped. Absent input yields an empty set.
pub fn parse_tags(tags: Option<&str>) -> Vec<String> {
    let Some(tags) = tags else {
        return Vec::new();
    };
    tags.split(',')
        .map(|tag| tag.chars().filter(|c| !c.is_whitespace()).collect::<String>())
        .filter(|tag| !tag.is_empty())
        .collect()
}

pub struct PostService<G> {
    gateway: Arc<G>,
    config: Config,
}

impl<G: Gateway> PostService<G> {
    pub fn new(gateway: Arc<G>, config: Config) -> Self {
        Self { gateway, config }
    }

    fn posts(&self) -> &str {
        &self.config.post_collection_id
    }

    /// Upload the attachment and derive its preview URL. If the preview step
    /// fails the freshly uploaded file is deleted before the error surfaces,
    /// so no unreferenced file is left behind.
    async fn upload_with_preview(&self, file: &FilePayload) -> Result<(String, String)> {
        let uploaded = self
            .gateway
            .upload_file(file)
            .await
            .map_err(log_err("upload failed"))?;
        match self.gateway.file_preview_url(&uploaded.id) {
            Ok(url) => Ok((uploaded.id, url)),
            Err(err) => {
                if let Err(cleanup) = self.gateway.delete_file(&uploaded.id).await {
                    warn!("compensating delete of file {} failed: {cleanup}", uploaded.id);
                }
                Err(log_err("preview failed")(err))
            }
        }
    }

    pub async fn create_post(&self, input: NewPost) -> Result<Post> {
        input.validate().map_err(Error::Invalid)?;

        let (image_id, image_url) = self.upload_with_preview(&input.file).await?;
        let data = json!({
            "creator": input.creator,
            "caption": input.caption,
            "imageUrl": image_url,
            "imageId": image_id,
            "location": input.location,
            "tags": parse_tags(input.tags.as_deref()),
            "likes": [],
            "expiresAt": expires_at(Utc::now()),
        });

        match self.gateway.create_document(self.posts(), data).await {
            Ok(document) => Ok(serde_json::from_value(document)?),
            Err(err) => {
                if let Err(cleanup) = self.gateway.delete_file(&image_id).await {
                    warn!("compensating delete of file {image_id} failed: {cleanup}");
                }
                Err(log_err("create_post: persist failed")(err))
            }
        }
    }

    pub async fn update_post(&self, input: UpdatePost) -> Result<Post> {
        input.validate().map_err(Error::Invalid)?;

        let mut image_id = input.image_id.clone();
        let mut image_url = input.image_url.clone();
        let mut replaced = false;
        if let Some(file) = &input.file {
            (image_id, image_url) = self.upload_with_preview(file).await?;
            replaced = true;
        }

        let data = json!({
            "caption": input.caption,
            "imageUrl": image_url,
            "imageId": image_id,
            "location": input.location,
            "tags": parse_tags(input.tags.as_deref()),
        });

        match self
            .gateway
            .update_document(self.posts(), &input.post_id, data)
            .await
        {
            Ok(document) => {
                // The old file goes only after the new metadata is committed;
                // deleting it earlier would dangle the document on failure.
                if replaced {
                    if let Err(cleanup) = self.gateway.delete_file(&input.image_id).await {
                        warn!("delete of replaced file {} failed: {cleanup}", input.image_id);
                    }
                }
                Ok(serde_json::from_value(document)?)
            }
            Err(err) => {
                if replaced {
                    if let Err(cleanup) = self.gateway.delete_file(&image_id).await {
                        warn!("compensating delete of file {image_id} failed: {cleanup}");
                    }
                }
                Err(log_err("update_post: persist failed")(err))
            }
        }
    }

    /// No-op when either identifier is absent. The document goes first; the
    /// file is only deleted once the document is gone.
    pub async fn delete_post(&self, post_id: Option<&str>, image_id: Option<&str>) -> Result<()> {
        let (Some(post_id), Some(image_id)) = (post_id, image_id) else {
            return Ok(());
        };
        self.gateway
            .delete_document(self.posts(), post_id)
            .await
            .map_err(log_err("delete_post: document delete failed"))?;
        self.gateway
            .delete_file(image_id)
            .await
            .map_err(log_err("delete_post: file delete failed"))?;
        Ok(())
    }

    pub async fn get_post_by_id(&self, post_id: &str) -> Result<Post> {
        let document = self
            .gateway
            .get_document(self.posts(), post_id)
            .await
            .map_err(log_err("get_post_by_id failed"))?;
        Ok(serde_json::from_value(document)?)
    }

    /// Forward-only feed ordered by most-recently-updated descending. The
    /// cursor is the id of the previous page's last item; `None` requests the
    /// first page.
    pub async fn posts_page(&self, cursor: Option<&str>) -> Result<Page<Post>> {
        let mut queries = vec![
            Query::order_desc("$updatedAt"),
            Query::Limit(FEED_PAGE_SIZE),
        ];
        if let Some(cursor) = cursor {
            queries.push(Query::cursor_after(cursor));
        }
        self.list_posts(&queries, "posts_page failed").await
    }

    pub async fn get_recent_posts(&self) -> Result<Page<Post>> {
        let queries = [
            Query::order_desc("$createdAt"),
            Query::Limit(RECENT_POSTS_LIMIT),
        ];
        self.list_posts(&queries, "get_recent_posts failed").await
    }

    pub async fn get_user_posts(&self, user_id: &str) -> Result<Page<Post>> {
        if user_id.is_empty() {
            return Ok(Page {
                total: 0,
                items: Vec::new(),
            });
        }
        let queries = [
            Query::equal("creator", user_id),
            Query::order_desc("$createdAt"),
        ];
        self.list_posts(&queries, "get_user_posts failed").await
    }

    /// Full-text match against captions only; relevance ordering is whatever
    /// the backing store provides.
    pub async fn search_posts(&self, term: &str) -> Result<Page<Post>> {
        let queries = [Query::search("caption", term)];
        self.list_posts(&queries, "search_posts failed").await
    }

    /// Persist the full resulting liker set as computed by the caller.
    /// Last writer wins; there is no server-side conflict resolution.
    pub async fn like_post(&self, post_id: &str, likes: &[String]) -> Result<Post> {
        let document = self
            .gateway
            .update_document(self.posts(), post_id, json!({ "likes": likes }))
            .await
            .map_err(log_err("like_post failed"))?;
        Ok(serde_json::from_value(document)?)
    }

    pub async fn save_post(&self, user_id: &str, post_id: &str) -> Result<SavedPost> {
        let document = self
            .gateway
            .create_document(
                &self.config.saves_collection_id,
                json!({ "user": user_id, "post": post_id }),
            )
            .await
            .map_err(log_err("save_post failed"))?;
        Ok(serde_json::from_value(document)?)
    }

    /// The caller must have resolved which save-record belongs to the post.
    pub async fn delete_saved_post(&self, saved_record_id: &str) -> Result<()> {
        self.gateway
            .delete_document(&self.config.saves_collection_id, saved_record_id)
            .await
            .map_err(log_err("delete_saved_post failed"))
    }

    async fn list_posts(&self, queries: &[Query], context: &'static str) -> Result<Page<Post>> {
        let page = self
            .gateway
            .list_documents(self.posts(), queries)
            .await
            .map_err(log_err(context))?;
        let items = page
            .documents
            .into_iter()
            .map(serde_json::from_value)
            .collect::<std::result::Result<Vec<Post>, _>>()?;
        Ok(Page {
            total: page.total,
            items,
        })
    }
}
