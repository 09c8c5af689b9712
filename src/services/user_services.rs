use std::sync::Arc;

use log::warn;
use serde_json::json;

use crate::config::Config;
use crate::dtos::UpdateUser;
use crate::error::{Error, Result, log_err};
use crate::models::User;
use crate::repositories::{Gateway, query::Query};

pub struct UserService<G> {
    gateway: Arc<G>,
    config: Config,
}

impl<G: Gateway> UserService<G> {
    pub fn new(gateway: Arc<G>, config: Config) -> Self {
        Self { gateway, config }
    }

    fn users(&self) -> &str {
        &self.config.user_collection_id
    }

    /// Newest-first user listing, optionally capped.
    pub async fn get_users(&self, limit: Option<u32>) -> Result<Vec<User>> {
        let mut queries = vec![Query::order_desc("$createdAt")];
        if let Some(limit) = limit {
            queries.push(Query::Limit(limit));
        }
        let page = self
            .gateway
            .list_documents(self.users(), &queries)
            .await
            .map_err(log_err("get_users failed"))?;
        page.documents
            .into_iter()
            .map(|doc| Ok(serde_json::from_value(doc)?))
            .collect()
    }

    pub async fn get_user_by_id(&self, user_id: &str) -> Result<User> {
        let document = self
            .gateway
            .get_document(self.users(), user_id)
            .await
            .map_err(log_err("get_user_by_id failed"))?;
        Ok(serde_json::from_value(document)?)
    }

    /// Profile update. A replacement avatar follows the same
    /// upload-then-commit-then-delete-old ordering as post image replacement;
    /// a profile that never had a stored file has nothing to clean up.
    pub async fn update_user(&self, input: UpdateUser) -> Result<User> {
        input.validate().map_err(Error::Invalid)?;

        let mut image_id = input.image_id.clone();
        let mut image_url = input.image_url.clone();
        let mut replaced = false;
        if let Some(file) = &input.file {
            let uploaded = self
                .gateway
                .upload_file(file)
                .await
                .map_err(log_err("update_user: upload failed"))?;
            match self.gateway.file_preview_url(&uploaded.id) {
                Ok(url) => {
                    image_id = Some(uploaded.id);
                    image_url = url;
                    replaced = true;
                }
                Err(err) => {
                    if let Err(cleanup) = self.gateway.delete_file(&uploaded.id).await {
                        warn!("compensating delete of file {} failed: {cleanup}", uploaded.id);
                    }
                    return Err(log_err("update_user: preview failed")(err));
                }
            }
        }

        let data = json!({
            "name": input.name,
            "bio": input.bio,
            "imageUrl": image_url,
            "imageId": image_id,
        });

        match self
            .gateway
            .update_document(self.users(), &input.user_id, data)
            .await
        {
            Ok(document) => {
                if replaced {
                    if let Some(old) = input.image_id.as_deref() {
                        if let Err(cleanup) = self.gateway.delete_file(old).await {
                            warn!("delete of replaced file {old} failed: {cleanup}");
                        }
                    }
                }
                Ok(serde_json::from_value(document)?)
            }
            Err(err) => {
                if replaced {
                    if let Some(new) = image_id.as_deref() {
                        if let Err(cleanup) = self.gateway.delete_file(new).await {
                            warn!("compensating delete of file {new} failed: {cleanup}");
                        }
                    }
                }
                Err(log_err("update_user: persist failed")(err))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use crate::repositories::fake_repo::{Call, FakeRepo, test_config};

    use super::*;

    fn service() -> (Arc<FakeRepo>, UserService<FakeRepo>) {
        let gateway = Arc::new(FakeRepo::new());
        let service = UserService::new(gateway.clone(), test_config());
        (gateway, service)
    }

    fn seed_user(gateway: &FakeRepo, id: &str, created_at: &str) {
        gateway.seed_document(
            "users",
            json!({
                "$id": id,
                "$createdAt": created_at,
                "accountId": format!("acc-{id}"),
                "name": format!("user {id}"),
                "email": format!("{id}@example.com"),
                "imageUrl": "https://avatars.test/initials?name=u",
            }),
        );
    }

    #[tokio::test]
    async fn users_come_back_newest_first_and_capped() {
        let (gateway, service) = service();
        seed_user(&gateway, "u1", "2026-01-01T00:00:00.000Z");
        seed_user(&gateway, "u2", "2026-01-02T00:00:00.000Z");
        seed_user(&gateway, "u3", "2026-01-03T00:00:00.000Z");

        let users = service.get_users(Some(2)).await.unwrap();
        assert_eq!(
            users.iter().map(|u| u.id.as_str()).collect::<Vec<_>>(),
            vec!["u3", "u2"]
        );
    }

    #[tokio::test]
    async fn update_user_without_prior_file_deletes_nothing_old() {
        let (gateway, service) = service();
        seed_user(&gateway, "u1", "2026-01-01T00:00:00.000Z");

        let input = UpdateUser {
            user_id: "u1".to_string(),
            name: "Ada".to_string(),
            bio: Some("pioneer".to_string()),
            image_id: None,
            image_url: "https://avatars.test/initials?name=u".to_string(),
            file: Some(crate::dtos::FilePayload::new(
                "avatar.png",
                "image/png",
                vec![1],
            )),
        };
        let user = service.update_user(input).await.unwrap();
        assert_eq!(user.image_id.as_deref(), Some("file-0"));

        let deletes: Vec<_> = gateway
            .calls()
            .into_iter()
            .filter(|c| matches!(c, Call::DeleteFile(_)))
            .collect();
        assert!(deletes.is_empty());
    }

    #[tokio::test]
    async fn update_user_replaces_and_cleans_up_the_old_avatar() {
        let (gateway, service) = service();
        seed_user(&gateway, "u1", "2026-01-01T00:00:00.000Z");

        let input = UpdateUser {
            user_id: "u1".to_string(),
            name: "Ada".to_string(),
            bio: None,
            image_id: Some("old-avatar".to_string()),
            image_url: "https://files.test/old-avatar/preview".to_string(),
            file: Some(crate::dtos::FilePayload::new(
                "avatar.png",
                "image/png",
                vec![1],
            )),
        };
        service.update_user(input).await.unwrap();

        let calls = gateway.calls();
        let update_at = calls
            .iter()
            .position(|c| matches!(c, Call::UpdateDocument(_, _)))
            .unwrap();
        let delete_at = calls
            .iter()
            .position(|c| *c == Call::DeleteFile("old-avatar".to_string()))
            .unwrap();
        assert!(update_at < delete_at);
    }
}
