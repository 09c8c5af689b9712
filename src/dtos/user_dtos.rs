use super::post_dtos::FilePayload;

/// Input for profile edits. `image_id`/`image_url` describe the current
/// avatar file; `file` is a replacement, when present.
#[derive(Debug, Clone)]
pub struct UpdateUser {
    pub user_id: String,
    pub name: String,
    pub bio: Option<String>,
    pub image_id: Option<String>,
    pub image_url: String,
    pub file: Option<FilePayload>,
}

impl UpdateUser {
    pub fn validate(&self) -> Result<(), String> {
        if self.user_id.trim().is_empty() {
            return Err("User id is required".to_string());
        }
        if self.name.trim().len() < 2 {
            return Err("Name must be at least 2 characters".to_string());
        }
        if let Some(file) = &self.file {
            file.validate()?;
        }
        Ok(())
    }
}
