use base64::{Engine as _, engine::general_purpose};

const ALLOWED_IMAGE_TYPES: &[&str] = &[
    "image/jpeg",
    "image/jpg",
    "image/png",
    "image/gif",
    "image/webp",
];

const MAX_CAPTION_LEN: usize = 2200;

/// Binary attachment for upload, either raw bytes or decoded from a base64
/// data-URL as submitted by uploaders.
#[derive(Debug, Clone)]
pub struct FilePayload {
    pub bytes: Vec<u8>,
    pub file_name: String,
    pub content_type: String,
}

impl FilePayload {
    pub fn new(file_name: impl Into<String>, content_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            bytes,
            file_name: file_name.into(),
            content_type: content_type.into(),
        }
    }

    /// Accepts both bare base64 and `data:image/...;base64,` prefixed input.
    pub fn from_data_url(
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        data: &str,
    ) -> Result<Self, String> {
        let encoded = match data.split_once(',') {
            Some((_, rest)) => rest,
            None => data,
        };
        let bytes = general_purpose::STANDARD
            .decode(encoded)
            .map_err(|e| format!("Invalid base64 image data: {e}"))?;
        Ok(Self::new(file_name, content_type, bytes))
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.bytes.is_empty() {
            return Err("File attachment is empty".to_string());
        }
        let mime: mime::Mime = self
            .content_type
            .parse()
            .map_err(|_| format!("Invalid content type: {}", self.content_type))?;
        if mime.type_() != mime::IMAGE || !ALLOWED_IMAGE_TYPES.contains(&self.content_type.as_str()) {
            return Err("Only JPEG, PNG, GIF and WEBP images are allowed".to_string());
        }
        Ok(())
    }
}

/// Input for post creation. A non-empty file attachment is required.
#[derive(Debug, Clone)]
pub struct NewPost {
    pub creator: String,
    pub caption: String,
    pub file: FilePayload,
    pub location: Option<String>,
    /// Comma-separated tag string; whitespace is stripped on parse.
    pub tags: Option<String>,
}

impl NewPost {
    pub fn validate(&self) -> Result<(), String> {
        if self.creator.trim().is_empty() {
            return Err("Post creator is required".to_string());
        }
        if self.caption.len() > MAX_CAPTION_LEN {
            return Err(format!("Caption must be at most {MAX_CAPTION_LEN} characters"));
        }
        self.file.validate()
    }
}

/// Input for post edits. `image_id`/`image_url` describe the current stored
/// file; `file` is a replacement, when present.
#[derive(Debug, Clone)]
pub struct UpdatePost {
    pub post_id: String,
    pub caption: String,
    pub image_id: String,
    pub image_url: String,
    pub location: Option<String>,
    pub tags: Option<String>,
    pub file: Option<FilePayload>,
}

impl UpdatePost {
    pub fn validate(&self) -> Result<(), String> {
        if self.post_id.trim().is_empty() {
            return Err("Post id is required".to_string());
        }
        if self.caption.len() > MAX_CAPTION_LEN {
            return Err(format!("Caption must be at most {MAX_CAPTION_LEN} characters"));
        }
        if let Some(file) = &self.file {
            file.validate()?;
        }
        Ok(())
    }
}
