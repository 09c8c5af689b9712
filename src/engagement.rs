//! Local engagement state for a single post. Like/save toggles apply to local
//! state immediately so the caller never waits on the network, then reconcile
//! against the persist result: on success the server copy is adopted, on
//! failure the snapshot taken before the toggle is restored.

use crate::error::Result;
use crate::models::{Post, User};
use crate::repositories::Gateway;
use crate::services::PostService;

/// Toggle `user_id` in a liker set, preserving the order of the others.
pub fn toggle_like(likes: &[String], user_id: &str) -> Vec<String> {
    if likes.iter().any(|id| id == user_id) {
        likes.iter().filter(|id| *id != user_id).cloned().collect()
    } else {
        let mut next = likes.to_vec();
        next.push(user_id.to_string());
        next
    }
}

#[derive(Debug, Clone, Default)]
pub struct EngagementState {
    likes: Vec<String>,
    saved: bool,
    save_record_id: Option<String>,
}

impl EngagementState {
    pub fn for_post(post: &Post, current_user: &User) -> Self {
        let save_record_id = current_user
            .save_record_for(&post.id)
            .map(str::to_string);
        Self {
            likes: post.likes.clone(),
            saved: save_record_id.is_some(),
            save_record_id,
        }
    }

    pub fn likes(&self) -> &[String] {
        &self.likes
    }

    pub fn like_count(&self) -> usize {
        self.likes.len()
    }

    pub fn is_liked_by(&self, user_id: &str) -> bool {
        self.likes.iter().any(|id| id == user_id)
    }

    pub fn is_saved(&self) -> bool {
        self.saved
    }

    /// Optimistically toggle the like and persist the resulting set.
    pub async fn toggle_like<G: Gateway>(
        &mut self,
        posts: &PostService<G>,
        post_id: &str,
        user_id: &str,
    ) -> Result<()> {
        let new_likes = toggle_like(&self.likes, user_id);
        let snapshot = std::mem::replace(&mut self.likes, new_likes);
        match posts.like_post(post_id, &self.likes).await {
            Ok(post) => {
                self.likes = post.likes;
                Ok(())
            }
            Err(err) => {
                self.likes = snapshot;
                Err(err)
            }
        }
    }

    /// Optimistically flip the saved flag, then create or delete the join
    /// record accordingly.
    pub async fn toggle_save<G: Gateway>(
        &mut self,
        posts: &PostService<G>,
        user_id: &str,
        post_id: &str,
    ) -> Result<()> {
        if self.saved {
            self.saved = false;
            let Some(record_id) = self.save_record_id.take() else {
                return Ok(());
            };
            if let Err(err) = posts.delete_saved_post(&record_id).await {
                self.saved = true;
                self.save_record_id = Some(record_id);
                return Err(err);
            }
            Ok(())
        } else {
            self.saved = true;
            match posts.save_post(user_id, post_id).await {
                Ok(record) => {
                    self.save_record_id = Some(record.id);
                    Ok(())
                }
                Err(err) => {
                    self.saved = false;
                    Err(err)
                }
            }
        }
    }
}
