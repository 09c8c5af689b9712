use std::sync::Arc;

use log::error;
use serde_json::json;

use crate::config::Config;
use crate::dtos::{Credentials, NewUser};
use crate::error::{Error, Result, log_err};
use crate::models::User;
use crate::repositories::{Gateway, Session, query::Query};

pub struct AuthService<G> {
    gateway: Arc<G>,
    config: Config,
}

impl<G: Gateway> AuthService<G> {
    pub fn new(gateway: Arc<G>, config: Config) -> Self {
        Self { gateway, config }
    }

    fn users(&self) -> &str {
        &self.config.user_collection_id
    }

    /// Create the auth identity, then persist the matching profile document
    /// with an initials avatar as the default image. There is no compensating
    /// deletion: if the profile persist fails, the identity is left behind.
    pub async fn sign_up(&self, input: NewUser) -> Result<User> {
        input.validate().map_err(Error::Invalid)?;

        let account = self
            .gateway
            .create_account(input.email.trim(), &input.password, &input.name)
            .await
            .map_err(log_err("sign_up: account creation failed"))?;
        let avatar_url = self
            .gateway
            .initials_avatar_url(&account.name)
            .map_err(log_err("sign_up: avatar derivation failed"))?;

        let data = json!({
            "accountId": account.id,
            "name": account.name,
            "email": account.email,
            "username": input.username,
            "imageUrl": avatar_url,
        });
        let document = match self.gateway.create_document(self.users(), data).await {
            Ok(document) => document,
            Err(err) => {
                error!(
                    "sign_up: profile persist failed, account {} left behind: {err}",
                    account.id
                );
                return Err(err);
            }
        };
        Ok(serde_json::from_value(document)?)
    }

    /// Exchange email+password for a session. Single attempt; failure
    /// surfaces immediately.
    pub async fn sign_in(&self, credentials: &Credentials) -> Result<Session> {
        self.gateway
            .create_email_session(credentials.email.trim(), &credentials.password)
            .await
            .map_err(log_err("sign_in failed"))
    }

    pub async fn sign_out(&self) -> Result<()> {
        self.gateway
            .delete_session()
            .await
            .map_err(log_err("sign_out failed"))
    }

    /// Resolve the active identity to its profile document.
    pub async fn get_current_user(&self) -> Result<User> {
        let account = self
            .gateway
            .get_account()
            .await
            .map_err(log_err("get_current_user: no active account"))?;
        let page = self
            .gateway
            .list_documents(self.users(), &[Query::equal("accountId", &account.id)])
            .await
            .map_err(log_err("get_current_user: profile lookup failed"))?;
        let document = page.documents.into_iter().next().ok_or_else(|| {
            log_err("get_current_user: no profile")(Error::NotFound(format!(
                "profile for account {}",
                account.id
            )))
        })?;
        Ok(serde_json::from_value(document)?)
    }
}
