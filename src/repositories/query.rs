use serde_json::{Value, json};

/// Query terms accepted by the store's list endpoint, serialized to its wire
/// form `{"method": ..., "attribute": ..., "values": [...]}`.
#[derive(Debug, Clone, PartialEq)]
pub enum Query {
    Equal(String, String),
    Search(String, String),
    GreaterThan(String, String),
    OrderDesc(String),
    Limit(u32),
    CursorAfter(String),
}

impl Query {
    pub fn equal(attribute: &str, value: &str) -> Self {
        Self::Equal(attribute.to_string(), value.to_string())
    }

    pub fn search(attribute: &str, term: &str) -> Self {
        Self::Search(attribute.to_string(), term.to_string())
    }

    pub fn greater_than(attribute: &str, value: &str) -> Self {
        Self::GreaterThan(attribute.to_string(), value.to_string())
    }

    pub fn order_desc(attribute: &str) -> Self {
        Self::OrderDesc(attribute.to_string())
    }

    pub fn cursor_after(document_id: &str) -> Self {
        Self::CursorAfter(document_id.to_string())
    }

    pub fn to_wire(&self) -> Value {
        match self {
            Self::Equal(attribute, value) => {
                json!({ "method": "equal", "attribute": attribute, "values": [value] })
            }
            Self::Search(attribute, term) => {
                json!({ "method": "search", "attribute": attribute, "values": [term] })
            }
            Self::GreaterThan(attribute, value) => {
                json!({ "method": "greaterThan", "attribute": attribute, "values": [value] })
            }
            Self::OrderDesc(attribute) => {
                json!({ "method": "orderDesc", "attribute": attribute })
            }
            Self::Limit(limit) => json!({ "method": "limit", "values": [limit] }),
            Self::CursorAfter(id) => json!({ "method": "cursorAfter", "values": [id] }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_to_the_wire_form() {
        assert_eq!(
            Query::equal("creator", "u1").to_wire().to_string(),
            r#"{"attribute":"creator","method":"equal","values":["u1"]}"#
        );
        assert_eq!(
            Query::Limit(9).to_wire().to_string(),
            r#"{"method":"limit","values":[9]}"#
        );
        assert_eq!(
            Query::cursor_after("doc-3").to_wire().to_string(),
            r#"{"method":"cursorAfter","values":["doc-3"]}"#
        );
    }
}
