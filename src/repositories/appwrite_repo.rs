use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client, StatusCode, multipart};
use serde_json::{Value, json};
use urlencoding::encode;
use uuid::Uuid;

use crate::config::Config;
use crate::dtos::FilePayload;
use crate::error::{Error, Result};

use super::{
    Account, DocumentPage, FileRef, Gateway, PREVIEW_GRAVITY, PREVIEW_HEIGHT, PREVIEW_QUALITY,
    PREVIEW_WIDTH, Session, query::Query,
};

/// HTTP gateway to the backing service. Constructed once from `Config` and
/// passed down explicitly; the session secret is the only mutable state.
#[derive(Clone)]
pub struct AppwriteRepo {
    client: Client,
    config: Config,
    session: Arc<RwLock<Option<String>>>,
}

impl AppwriteRepo {
    pub fn new(config: Config) -> Self {
        Self {
            client: Client::new(),
            config,
            session: Arc::new(RwLock::new(None)),
        }
    }

    fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.config.endpoint.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    fn documents_url(&self, collection_id: &str) -> String {
        self.url(&format!(
            "databases/{}/collections/{}/documents",
            self.config.database_id, collection_id
        ))
    }

    fn files_url(&self) -> String {
        self.url(&format!("storage/buckets/{}/files", self.config.storage_id))
    }

    fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            "X-Appwrite-Project",
            HeaderValue::from_str(&self.config.project_id).expect("project id header"),
        );
        if let Some(secret) = self.session.read().expect("session lock").as_deref() {
            headers.insert(
                "X-Appwrite-Session",
                HeaderValue::from_str(secret).expect("session header"),
            );
        }
        if let Some(key) = self.config.api_key.as_deref() {
            headers.insert(
                "X-Appwrite-Key",
                HeaderValue::from_str(key).expect("api key header"),
            );
        }
        headers
    }
}

#[async_trait]
impl Gateway for AppwriteRepo {
    async fn create_document(&self, collection_id: &str, data: Value) -> Result<Value> {
        let url = self.documents_url(collection_id);
        let body = json!({ "documentId": Uuid::new_v4().to_string(), "data": data });

        let resp = self
            .client
            .post(&url)
            .headers(self.headers())
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        let text = resp.text().await?;
        if !status.is_success() {
            return Err(Error::Persistence(format!(
                "create in {collection_id} failed: {} -> {}",
                status.as_u16(),
                text
            )));
        }
        Ok(serde_json::from_str(&text)?)
    }

    async fn get_document(&self, collection_id: &str, document_id: &str) -> Result<Value> {
        let url = format!("{}/{}", self.documents_url(collection_id), document_id);

        let resp = self.client.get(&url).headers(self.headers()).send().await?;

        let status = resp.status();
        let text = resp.text().await?;
        if status == StatusCode::NOT_FOUND {
            return Err(Error::NotFound(format!(
                "document {document_id} in {collection_id}"
            )));
        }
        if !status.is_success() {
            return Err(Error::Persistence(format!(
                "get {document_id} from {collection_id} failed: {} -> {}",
                status.as_u16(),
                text
            )));
        }
        Ok(serde_json::from_str(&text)?)
    }

    async fn update_document(
        &self,
        collection_id: &str,
        document_id: &str,
        data: Value,
    ) -> Result<Value> {
        let url = format!("{}/{}", self.documents_url(collection_id), document_id);

        let resp = self
            .client
            .patch(&url)
            .headers(self.headers())
            .json(&json!({ "data": data }))
            .send()
            .await?;

        let status = resp.status();
        let text = resp.text().await?;
        if !status.is_success() {
            return Err(Error::Persistence(format!(
                "update {document_id} in {collection_id} failed: {} -> {}",
                status.as_u16(),
                text
            )));
        }
        Ok(serde_json::from_str(&text)?)
    }

    async fn delete_document(&self, collection_id: &str, document_id: &str) -> Result<()> {
        let url = format!("{}/{}", self.documents_url(collection_id), document_id);

        let resp = self
            .client
            .delete(&url)
            .headers(self.headers())
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(Error::Persistence(format!(
                "delete {document_id} from {collection_id} failed: {} -> {}",
                status.as_u16(),
                text
            )));
        }
        Ok(())
    }

    async fn list_documents(&self, collection_id: &str, queries: &[Query]) -> Result<DocumentPage> {
        let mut url = self.documents_url(collection_id);
        let mut separator = '?';
        for query in queries {
            url.push(separator);
            separator = '&';
            url.push_str("queries[]=");
            url.push_str(&encode(&query.to_wire().to_string()));
        }

        let resp = self.client.get(&url).headers(self.headers()).send().await?;

        let status = resp.status();
        let text = resp.text().await?;
        if !status.is_success() {
            return Err(Error::Persistence(format!(
                "list {collection_id} failed: {} -> {}",
                status.as_u16(),
                text
            )));
        }
        Ok(serde_json::from_str(&text)?)
    }

    async fn upload_file(&self, file: &FilePayload) -> Result<FileRef> {
        let part = multipart::Part::bytes(file.bytes.clone())
            .file_name(file.file_name.clone())
            .mime_str(&file.content_type)?;
        let form = multipart::Form::new()
            .text("fileId", Uuid::new_v4().to_string())
            .part("file", part);

        let resp = self
            .client
            .post(self.files_url())
            .headers(self.headers())
            .multipart(form)
            .send()
            .await?;

        let status = resp.status();
        let text = resp.text().await?;
        if !status.is_success() {
            return Err(Error::Upload(format!(
                "upload of {} failed: {} -> {}",
                file.file_name,
                status.as_u16(),
                text
            )));
        }
        Ok(serde_json::from_str(&text)?)
    }

    fn file_preview_url(&self, file_id: &str) -> Result<String> {
        let url = format!(
            "{}/{}/preview?width={PREVIEW_WIDTH}&height={PREVIEW_HEIGHT}&gravity={PREVIEW_GRAVITY}&quality={PREVIEW_QUALITY}&project={}",
            self.files_url(),
            encode(file_id),
            encode(&self.config.project_id),
        );
        reqwest::Url::parse(&url).map_err(|e| Error::Upload(format!("preview url: {e}")))?;
        Ok(url)
    }

    async fn delete_file(&self, file_id: &str) -> Result<()> {
        let url = format!("{}/{}", self.files_url(), file_id);

        let resp = self
            .client
            .delete(&url)
            .headers(self.headers())
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(Error::Upload(format!(
                "delete of file {file_id} failed: {} -> {}",
                status.as_u16(),
                text
            )));
        }
        Ok(())
    }

    async fn create_account(&self, email: &str, password: &str, name: &str) -> Result<Account> {
        let url = self.url("account");
        let body = json!({
            "userId": Uuid::new_v4().to_string(),
            "email": email,
            "password": password,
            "name": name,
        });

        let resp = self
            .client
            .post(&url)
            .headers(self.headers())
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        let text = resp.text().await?;
        if !status.is_success() {
            return Err(Error::Auth(format!(
                "account creation failed: {} -> {}",
                status.as_u16(),
                text
            )));
        }
        Ok(serde_json::from_str(&text)?)
    }

    async fn create_email_session(&self, email: &str, password: &str) -> Result<Session> {
        let url = self.url("account/sessions/email");
        let body = json!({ "email": email, "password": password });

        let resp = self
            .client
            .post(&url)
            .headers(self.headers())
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        let text = resp.text().await?;
        if !status.is_success() {
            return Err(Error::Auth(format!(
                "session creation failed: {} -> {}",
                status.as_u16(),
                text
            )));
        }
        let session: Session = serde_json::from_str(&text)?;
        *self.session.write().expect("session lock") = Some(session.secret.clone());
        Ok(session)
    }

    async fn get_account(&self) -> Result<Account> {
        let url = self.url("account");

        let resp = self.client.get(&url).headers(self.headers()).send().await?;

        let status = resp.status();
        let text = resp.text().await?;
        if !status.is_success() {
            return Err(Error::Auth(format!(
                "no active account: {} -> {}",
                status.as_u16(),
                text
            )));
        }
        Ok(serde_json::from_str(&text)?)
    }

    async fn delete_session(&self) -> Result<()> {
        let url = self.url("account/sessions/current");

        let resp = self
            .client
            .delete(&url)
            .headers(self.headers())
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(Error::Auth(format!(
                "sign-out failed: {} -> {}",
                status.as_u16(),
                text
            )));
        }
        *self.session.write().expect("session lock") = None;
        Ok(())
    }

    fn initials_avatar_url(&self, name: &str) -> Result<String> {
        let url = format!(
            "{}?name={}&project={}",
            self.url("avatars/initials"),
            encode(name),
            encode(&self.config.project_id)
        );
        reqwest::Url::parse(&url).map_err(|e| Error::Auth(format!("avatar url: {e}")))?;
        Ok(url)
    }
}
