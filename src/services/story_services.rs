use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, Utc};
use log::{info, warn};
use serde_json::{Value, json};

use crate::config::Config;
use crate::dtos::NewStory;
use crate::error::{Error, Result, log_err};
use crate::models::Story;
use crate::realtime::{self, EventKind, Subscription};
use crate::repositories::{Gateway, query::Query};

/// Visibility window of time-boxed content, in hours.
pub const STORY_TTL_HOURS: i64 = 24;

/// Expiry instant for content created at `created_at`: the absolute instant
/// 24 hours later, computed once at creation and stored immutably. Posts and
/// stories share this arithmetic.
pub fn expires_at(created_at: DateTime<Utc>) -> DateTime<Utc> {
    created_at + chrono::Duration::hours(STORY_TTL_HOURS)
}

/// A story creation or deletion observed on the push channel. Delivery is
/// at-least-once and unordered across items; consumers deduplicate by id.
#[derive(Debug, Clone)]
pub struct StoryEvent {
    pub kind: EventKind,
    pub story: Story,
}

/// Live story updates. `recv` yields events until the stream is closed or the
/// connection drops; `close` detaches the listener.
pub struct StoryStream {
    inner: Subscription,
}

impl StoryStream {
    pub async fn recv(&mut self) -> Option<StoryEvent> {
        loop {
            let event = self.inner.recv().await?;
            match serde_json::from_value(event.payload) {
                Ok(story) => {
                    return Some(StoryEvent {
                        kind: event.kind,
                        story,
                    });
                }
                Err(err) => {
                    warn!("dropping malformed story payload: {err}");
                }
            }
        }
    }

    /// No further events are delivered after this returns.
    pub fn close(self) {
        self.inner.close();
    }
}

pub struct StoryService<G> {
    gateway: Arc<G>,
    config: Config,
}

impl<G: Gateway> StoryService<G> {
    pub fn new(gateway: Arc<G>, config: Config) -> Self {
        Self { gateway, config }
    }

    fn stories(&self) -> &str {
        &self.config.stories_collection_id
    }

    pub async fn create_story(&self, input: NewStory) -> Result<Story> {
        input.validate().map_err(Error::Invalid)?;

        let uploaded = self
            .gateway
            .upload_file(&input.file)
            .await
            .map_err(log_err("create_story: upload failed"))?;
        let image_url = match self.gateway.file_preview_url(&uploaded.id) {
            Ok(url) => url,
            Err(err) => {
                if let Err(cleanup) = self.gateway.delete_file(&uploaded.id).await {
                    warn!("compensating delete of file {} failed: {cleanup}", uploaded.id);
                }
                return Err(log_err("create_story: preview failed")(err));
            }
        };

        let data = json!({
            "creator": input.creator,
            "imageUrl": image_url,
            "imageId": uploaded.id,
            "expiresAt": expires_at(Utc::now()),
        });

        match self.gateway.create_document(self.stories(), data).await {
            Ok(document) => Ok(serde_json::from_value(document)?),
            Err(err) => {
                if let Err(cleanup) = self.gateway.delete_file(&uploaded.id).await {
                    warn!("compensating delete of file {} failed: {cleanup}", uploaded.id);
                }
                Err(log_err("create_story: persist failed")(err))
            }
        }
    }

    /// Stories whose expiry is strictly after the current instant. Expired
    /// stories are filtered out here, never deleted.
    pub async fn get_active_stories(&self) -> Result<Vec<Story>> {
        let now = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
        let page = self
            .gateway
            .list_documents(self.stories(), &[Query::greater_than("expiresAt", &now)])
            .await
            .map_err(log_err("get_active_stories failed"))?;
        page.documents
            .into_iter()
            .map(|doc| Ok(serde_json::from_value(doc)?))
            .collect()
    }

    /// One-shot maintenance: backfill the expiry attribute on legacy
    /// documents as creation time + 24h. Documents already carrying an expiry
    /// are skipped, so a second run performs zero updates. Returns the number
    /// of documents updated.
    pub async fn backfill_expiry(&self, collection_id: &str) -> Result<u64> {
        const SCAN_PAGE_SIZE: u32 = 100;

        let mut updated = 0;
        let mut cursor: Option<String> = None;
        loop {
            let mut queries = vec![Query::Limit(SCAN_PAGE_SIZE)];
            if let Some(cursor) = &cursor {
                queries.push(Query::cursor_after(cursor));
            }
            let page = self
                .gateway
                .list_documents(collection_id, &queries)
                .await
                .map_err(log_err("backfill_expiry: scan failed"))?;
            if page.documents.is_empty() {
                break;
            }
            cursor = page
                .documents
                .last()
                .and_then(|doc| doc.get("$id"))
                .and_then(Value::as_str)
                .map(str::to_string);

            for document in &page.documents {
                if !needs_expiry(document) {
                    continue;
                }
                let Some(id) = document.get("$id").and_then(Value::as_str) else {
                    continue;
                };
                let Some(created_at) = document
                    .get("$createdAt")
                    .and_then(Value::as_str)
                    .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
                else {
                    warn!("skipping {id}: unparseable creation timestamp");
                    continue;
                };
                let expiry = expires_at(created_at.with_timezone(&Utc));
                self.gateway
                    .update_document(collection_id, id, json!({ "expiresAt": expiry }))
                    .await
                    .map_err(log_err("backfill_expiry: update failed"))?;
                updated += 1;
            }

            if page.documents.len() < SCAN_PAGE_SIZE as usize {
                break;
            }
        }
        info!("backfilled expiry on {updated} documents in {collection_id}");
        Ok(updated)
    }

    /// Subscribe to story creations and deletions on the push channel.
    pub async fn subscribe(&self) -> Result<StoryStream> {
        let channel = realtime::story_channel(&self.config);
        let inner = realtime::subscribe(&self.config, &channel).await?;
        Ok(StoryStream { inner })
    }
}

fn needs_expiry(document: &Value) -> bool {
    matches!(document.get("expiresAt"), None | Some(Value::Null))
}
