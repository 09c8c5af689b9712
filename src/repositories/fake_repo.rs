//! In-memory gateway for service tests. Records every call in order so
//! compensation sequencing can be asserted, and honors enough of the query
//! language (equal, search, greater-than, order, cursor, limit) to exercise
//! pagination and read-time filters.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use serde_json::{Value, json};

use crate::dtos::FilePayload;
use crate::error::{Error, Result};

use super::{Account, DocumentPage, FileRef, Gateway, Session, query::Query};

/// Config used by service tests; collection ids double as readable labels in
/// recorded calls.
pub fn test_config() -> crate::config::Config {
    crate::config::Config {
        endpoint: "https://backend.test/v1".to_string(),
        project_id: "proj".to_string(),
        database_id: "db".to_string(),
        user_collection_id: "users".to_string(),
        post_collection_id: "posts".to_string(),
        saves_collection_id: "saves".to_string(),
        stories_collection_id: "stories".to_string(),
        storage_id: "media".to_string(),
        api_key: None,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    CreateDocument(String),
    GetDocument(String, String),
    UpdateDocument(String, String),
    DeleteDocument(String, String),
    ListDocuments(String),
    UploadFile(String),
    PreviewUrl(String),
    DeleteFile(String),
    CreateAccount(String),
    CreateSession(String),
    GetAccount,
    DeleteSession,
}

#[derive(Default)]
struct State {
    calls: Vec<Call>,
    collections: HashMap<String, Vec<Value>>,
    account: Option<Account>,
}

#[derive(Default)]
pub struct FakeRepo {
    state: Mutex<State>,
    next_id: AtomicU64,
    pub fail_upload: AtomicBool,
    pub fail_preview: AtomicBool,
    pub fail_create_document: AtomicBool,
    pub fail_update_document: AtomicBool,
    pub fail_delete_document: AtomicBool,
}

impl FakeRepo {
    pub fn new() -> Self {
        Self::default()
    }

    fn fresh_id(&self, prefix: &str) -> String {
        format!("{prefix}-{}", self.next_id.fetch_add(1, Ordering::SeqCst))
    }

    pub fn seed_document(&self, collection_id: &str, document: Value) {
        let mut state = self.state.lock().unwrap();
        state
            .collections
            .entry(collection_id.to_string())
            .or_default()
            .push(document);
    }

    pub fn set_account(&self, account: Account) {
        self.state.lock().unwrap().account = Some(account);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn documents(&self, collection_id: &str) -> Vec<Value> {
        self.state
            .lock()
            .unwrap()
            .collections
            .get(collection_id)
            .cloned()
            .unwrap_or_default()
    }

    fn record(&self, call: Call) {
        self.state.lock().unwrap().calls.push(call);
    }

    fn attr<'a>(document: &'a Value, attribute: &str) -> Option<&'a str> {
        document.get(attribute).and_then(Value::as_str)
    }

    fn apply_queries(mut documents: Vec<Value>, queries: &[Query]) -> Vec<Value> {
        for query in queries {
            match query {
                Query::Equal(attribute, value) => {
                    documents.retain(|d| Self::attr(d, attribute) == Some(value.as_str()));
                }
                Query::Search(attribute, term) => {
                    documents.retain(|d| {
                        Self::attr(d, attribute).is_some_and(|text| text.contains(term.as_str()))
                    });
                }
                Query::GreaterThan(attribute, value) => {
                    documents.retain(|d| {
                        Self::attr(d, attribute).is_some_and(|v| v > value.as_str())
                    });
                }
                _ => {}
            }
        }
        for query in queries {
            if let Query::OrderDesc(attribute) = query {
                documents.sort_by(|a, b| {
                    Self::attr(b, attribute).cmp(&Self::attr(a, attribute))
                });
            }
        }
        for query in queries {
            if let Query::CursorAfter(cursor) = query {
                if let Some(position) = documents
                    .iter()
                    .position(|d| Self::attr(d, "$id") == Some(cursor.as_str()))
                {
                    documents.drain(..=position);
                } else {
                    documents.clear();
                }
            }
        }
        for query in queries {
            if let Query::Limit(limit) = query {
                documents.truncate(*limit as usize);
            }
        }
        documents
    }
}

#[async_trait]
impl Gateway for FakeRepo {
    async fn create_document(&self, collection_id: &str, data: Value) -> Result<Value> {
        self.record(Call::CreateDocument(collection_id.to_string()));
        if self.fail_create_document.load(Ordering::SeqCst) {
            return Err(Error::Persistence("create rejected".to_string()));
        }
        let now = Utc::now();
        let mut document = json!({
            "$id": self.fresh_id("doc"),
            "$createdAt": now,
            "$updatedAt": now,
        });
        if let (Some(target), Some(source)) = (document.as_object_mut(), data.as_object()) {
            for (key, value) in source {
                target.insert(key.clone(), value.clone());
            }
        }
        let mut state = self.state.lock().unwrap();
        state
            .collections
            .entry(collection_id.to_string())
            .or_default()
            .push(document.clone());
        Ok(document)
    }

    async fn get_document(&self, collection_id: &str, document_id: &str) -> Result<Value> {
        self.record(Call::GetDocument(
            collection_id.to_string(),
            document_id.to_string(),
        ));
        let state = self.state.lock().unwrap();
        state
            .collections
            .get(collection_id)
            .and_then(|docs| {
                docs.iter()
                    .find(|d| Self::attr(d, "$id") == Some(document_id))
            })
            .cloned()
            .ok_or_else(|| Error::NotFound(format!("document {document_id} in {collection_id}")))
    }

    async fn update_document(
        &self,
        collection_id: &str,
        document_id: &str,
        data: Value,
    ) -> Result<Value> {
        self.record(Call::UpdateDocument(
            collection_id.to_string(),
            document_id.to_string(),
        ));
        if self.fail_update_document.load(Ordering::SeqCst) {
            return Err(Error::Persistence("update rejected".to_string()));
        }
        let mut state = self.state.lock().unwrap();
        let document = state
            .collections
            .get_mut(collection_id)
            .and_then(|docs| {
                docs.iter_mut()
                    .find(|d| Self::attr(d, "$id") == Some(document_id))
            })
            .ok_or_else(|| Error::NotFound(format!("document {document_id} in {collection_id}")))?;
        if let (Some(target), Some(source)) = (document.as_object_mut(), data.as_object()) {
            for (key, value) in source {
                target.insert(key.clone(), value.clone());
            }
            target.insert("$updatedAt".to_string(), json!(Utc::now()));
        }
        Ok(document.clone())
    }

    async fn delete_document(&self, collection_id: &str, document_id: &str) -> Result<()> {
        self.record(Call::DeleteDocument(
            collection_id.to_string(),
            document_id.to_string(),
        ));
        if self.fail_delete_document.load(Ordering::SeqCst) {
            return Err(Error::Persistence("delete rejected".to_string()));
        }
        let mut state = self.state.lock().unwrap();
        if let Some(docs) = state.collections.get_mut(collection_id) {
            docs.retain(|d| Self::attr(d, "$id") != Some(document_id));
        }
        Ok(())
    }

    async fn list_documents(&self, collection_id: &str, queries: &[Query]) -> Result<DocumentPage> {
        self.record(Call::ListDocuments(collection_id.to_string()));
        let documents = {
            let state = self.state.lock().unwrap();
            state
                .collections
                .get(collection_id)
                .cloned()
                .unwrap_or_default()
        };
        let total = documents.len() as u64;
        let documents = Self::apply_queries(documents, queries);
        Ok(DocumentPage { total, documents })
    }

    async fn upload_file(&self, file: &FilePayload) -> Result<FileRef> {
        self.record(Call::UploadFile(file.file_name.clone()));
        if self.fail_upload.load(Ordering::SeqCst) {
            return Err(Error::Upload("upload rejected".to_string()));
        }
        Ok(FileRef {
            id: self.fresh_id("file"),
        })
    }

    fn file_preview_url(&self, file_id: &str) -> Result<String> {
        self.record(Call::PreviewUrl(file_id.to_string()));
        if self.fail_preview.load(Ordering::SeqCst) {
            return Err(Error::Upload("preview rejected".to_string()));
        }
        Ok(format!("https://files.test/{file_id}/preview"))
    }

    async fn delete_file(&self, file_id: &str) -> Result<()> {
        self.record(Call::DeleteFile(file_id.to_string()));
        Ok(())
    }

    async fn create_account(&self, email: &str, _password: &str, name: &str) -> Result<Account> {
        self.record(Call::CreateAccount(email.to_string()));
        let account = Account {
            id: self.fresh_id("acc"),
            name: name.to_string(),
            email: email.to_string(),
        };
        self.state.lock().unwrap().account = Some(account.clone());
        Ok(account)
    }

    async fn create_email_session(&self, email: &str, _password: &str) -> Result<Session> {
        self.record(Call::CreateSession(email.to_string()));
        let state = self.state.lock().unwrap();
        match &state.account {
            Some(account) if account.email == email => Ok(Session {
                id: self.fresh_id("sess"),
                user_id: account.id.clone(),
                secret: "secret".to_string(),
            }),
            _ => Err(Error::Auth("invalid credentials".to_string())),
        }
    }

    async fn get_account(&self) -> Result<Account> {
        self.record(Call::GetAccount);
        self.state
            .lock()
            .unwrap()
            .account
            .clone()
            .ok_or_else(|| Error::Auth("no active session".to_string()))
    }

    async fn delete_session(&self) -> Result<()> {
        self.record(Call::DeleteSession);
        Ok(())
    }

    fn initials_avatar_url(&self, name: &str) -> Result<String> {
        Ok(format!(
            "https://avatars.test/initials?name={}",
            urlencoding::encode(name)
        ))
    }
}
