//! One-shot maintenance: backfill the expiry attribute on legacy posts and
//! stories that predate it. Requires the privileged API key; safe to re-run,
//! a second pass performs zero updates.

use std::sync::Arc;

use anyhow::{Context, Result};
use log::info;

use glimpse::Config;
use glimpse::repositories::AppwriteRepo;
use glimpse::services::StoryService;

fn mask_key(k: &str) -> String {
    if k.len() <= 8 {
        "[REDACTED]".to_string()
    } else {
        format!("{}***{}", &k[..4], &k[k.len() - 4..])
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    dotenv::dotenv().ok();

    let config = Config::from_env()?;
    let key = config
        .api_key
        .as_deref()
        .context("APPWRITE_API_KEY must be set for maintenance scripts")?;
    info!("endpoint: {}", config.endpoint);
    info!("api key: {}", mask_key(key));

    let gateway = Arc::new(AppwriteRepo::new(config.clone()));
    let stories = StoryService::new(gateway, config.clone());

    let updated = stories.backfill_expiry(&config.post_collection_id).await?;
    info!("posts backfilled: {updated}");
    let updated = stories.backfill_expiry(&config.stories_collection_id).await?;
    info!("stories backfilled: {updated}");

    Ok(())
}
