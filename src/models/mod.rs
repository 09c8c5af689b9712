pub mod post;
pub mod story;
pub mod user;

pub use post::{Post, SavedPost};
pub use story::Story;
pub use user::User;

/// Relationship attributes come back from the store either as a bare id or as
/// an expanded document; both collapse to the id string here so the rest of
/// the crate only ever sees identifiers.
pub(crate) mod doc_ref {
    use serde::de::Error as DeError;
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    pub fn ref_id(value: &Value) -> Option<String> {
        match value {
            Value::String(s) => Some(s.clone()),
            Value::Object(map) => map.get("$id").and_then(Value::as_str).map(str::to_string),
            _ => None,
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<String, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        ref_id(&value).ok_or_else(|| D::Error::custom("expected an id or a document reference"))
    }

    pub fn deserialize_opt<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<Value>::deserialize(deserializer)? {
            None | Some(Value::Null) => Ok(None),
            Some(value) => ref_id(&value)
                .map(Some)
                .ok_or_else(|| D::Error::custom("expected an id or a document reference")),
        }
    }

    pub fn deserialize_vec<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let values = Vec::<Value>::deserialize(deserializer)?;
        values
            .iter()
            .map(|v| ref_id(v).ok_or_else(|| D::Error::custom("expected an id or a document reference")))
            .collect()
    }
}
