//! Versioned per-document decoration tokens.

use serde::{Deserialize, Serialize};

/// One document's decoration state as computed by the external decoration
/// subsystem.
///
/// `version_identifier` changes every time a new decoration computation
/// lands for the document; equality across two polls means "no new
/// computation happened yet". An empty identifier is the "nothing
/// returned yet" sentinel. `hats` is an opaque payload forwarded to
/// clients untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecorationToken {
    pub document_id: String,

    #[serde(default)]
    pub version_identifier: String,

    #[serde(default)]
    pub hats: serde_json::Value,
}

impl DecorationToken {
    /// The "nothing computed yet" token for a document.
    pub fn sentinel(document_id: impl Into<String>) -> Self {
        Self {
            document_id: document_id.into(),
            version_identifier: String::new(),
            hats: serde_json::Value::Null,
        }
    }

    /// True when no decoration computation has been observed yet.
    pub fn is_sentinel(&self) -> bool {
        self.version_identifier.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentinel() {
        let token = DecorationToken::sentinel("/a.txt");
        assert!(token.is_sentinel());
        assert_eq!(token.document_id, "/a.txt");
    }

    #[test]
    fn test_wire_format_is_camel_case() {
        let token: DecorationToken = serde_json::from_str(
            r#"{"documentId": "/a.txt", "versionIdentifier": "v3", "hats": {"default": []}}"#,
        )
        .unwrap();
        assert_eq!(token.version_identifier, "v3");
        assert!(!token.is_sentinel());

        let v = serde_json::to_value(&token).unwrap();
        assert!(v.get("documentId").is_some());
        assert!(v.get("versionIdentifier").is_some());
    }
}
