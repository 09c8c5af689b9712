use super::post_dtos::FilePayload;

/// Input for story creation. The expiry instant is assigned by the service
/// layer, never by the caller.
#[derive(Debug, Clone)]
pub struct NewStory {
    pub creator: String,
    pub file: FilePayload,
}

impl NewStory {
    pub fn validate(&self) -> Result<(), String> {
        if self.creator.trim().is_empty() {
            return Err("Story creator is required".to_string());
        }
        self.file.validate()
    }
}
