//! Twin records and content slots.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A paired device/identity proxy.
///
/// The live relay connection of a twin is owned by the relay hub and is
/// never part of this record, so the JSON shape stays
/// `{ id, cidn, cidh, pid, wallet }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Twin {
    /// Unique, stable identifier. Lookups are exact-match.
    pub id: String,
    /// Content pointer stored in the `N` slot.
    #[serde(rename = "cidn", default)]
    pub content_pointer_normal: String,
    /// Content pointer stored in the `H` slot.
    #[serde(rename = "cidh", default)]
    pub content_pointer_hash: String,
    /// Push token of the paired phone. Blank means unset.
    #[serde(rename = "pid", default)]
    pub push_token: String,
    /// Wallet address, free-form.
    #[serde(rename = "wallet", default)]
    pub wallet_address: String,
}

impl Twin {
    /// Create a twin with every field except the id left blank.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            content_pointer_normal: String::new(),
            content_pointer_hash: String::new(),
            push_token: String::new(),
            wallet_address: String::new(),
        }
    }

    /// The push token, or `None` when it is empty or whitespace only.
    pub fn push_token(&self) -> Option<&str> {
        let token = self.push_token.trim();
        if token.is_empty() { None } else { Some(token) }
    }

    pub fn content_pointer(&self, slot: ContentSlot) -> &str {
        match slot {
            ContentSlot::Normal => &self.content_pointer_normal,
            ContentSlot::Hash => &self.content_pointer_hash,
        }
    }

    pub fn set_content_pointer(&mut self, slot: ContentSlot, value: impl Into<String>) {
        match slot {
            ContentSlot::Normal => self.content_pointer_normal = value.into(),
            ContentSlot::Hash => self.content_pointer_hash = value.into(),
        }
    }
}

/// The seed record present when no other seed data is configured.
impl Default for Twin {
    fn default() -> Self {
        Self {
            id: "123".to_string(),
            content_pointer_normal: "QmQkSRjw9XWrjLqjL2nZEX2W3Nc1cQketizuo1cXFuYDLX".to_string(),
            content_pointer_hash: "QmVUkHEBtfkVA1S2q9XejWjmG1ztN5SLG6hUkue3hcZUNQ".to_string(),
            push_token: "ExponentPushToken[hYboGjMd_zeSNnRdMJMjtE]".to_string(),
            wallet_address: " ".to_string(),
        }
    }
}

/// Which of the two content pointer slots an update targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentSlot {
    Normal,
    Hash,
}

impl ContentSlot {
    /// The single-letter tag used on the wire.
    pub fn tag(self) -> &'static str {
        match self {
            ContentSlot::Normal => "N",
            ContentSlot::Hash => "H",
        }
    }
}

impl fmt::Display for ContentSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// A slot tag other than `N` or `H`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid content slot '{0}', expected N or H")]
pub struct InvalidSlotTag(pub String);

impl FromStr for ContentSlot {
    type Err = InvalidSlotTag;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "N" => Ok(ContentSlot::Normal),
            "H" => Ok(ContentSlot::Hash),
            other => Err(InvalidSlotTag(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_twin_wire_shape() {
        let twin = Twin {
            id: "a".into(),
            content_pointer_normal: "n".into(),
            content_pointer_hash: "h".into(),
            push_token: "p".into(),
            wallet_address: "w".into(),
        };
        let value = serde_json::to_value(&twin).unwrap();
        assert_eq!(
            value,
            json!({ "id": "a", "cidn": "n", "cidh": "h", "pid": "p", "wallet": "w" })
        );
    }

    #[test]
    fn test_twin_missing_fields_default_to_blank() {
        let twin: Twin = serde_json::from_str(r#"{"id":"42"}"#).unwrap();
        assert_eq!(twin, Twin::new("42"));
    }

    #[test]
    fn test_twin_requires_id() {
        assert!(serde_json::from_str::<Twin>(r#"{"cidn":"x"}"#).is_err());
    }

    #[test]
    fn test_push_token_sentinel() {
        let mut twin = Twin::new("1");
        assert_eq!(twin.push_token(), None);
        twin.push_token = " ".into();
        assert_eq!(twin.push_token(), None);
        twin.push_token = "ExponentPushToken[abc]".into();
        assert_eq!(twin.push_token(), Some("ExponentPushToken[abc]"));
    }

    #[test]
    fn test_slot_parsing() {
        assert_eq!("N".parse::<ContentSlot>(), Ok(ContentSlot::Normal));
        assert_eq!("H".parse::<ContentSlot>(), Ok(ContentSlot::Hash));
        assert_eq!("n".parse::<ContentSlot>(), Err(InvalidSlotTag("n".into())));
        assert!("".parse::<ContentSlot>().is_err());
    }

    #[test]
    fn test_set_content_pointer_touches_one_slot() {
        let mut twin = Twin::default();
        let hash_before = twin.content_pointer_hash.clone();
        twin.set_content_pointer(ContentSlot::Normal, "QmNew");
        assert_eq!(twin.content_pointer(ContentSlot::Normal), "QmNew");
        assert_eq!(twin.content_pointer_hash, hash_before);
    }
}
