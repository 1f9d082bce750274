#![forbid(unsafe_code)]

//! Customer record as exchanged with the remote service.
//!
//! A [`Record`] without an id is a draft: it has never been persisted. The
//! server assigns the id on creation and the client never invents one.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Server-assigned record identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(pub i64);

impl RecordId {
    /// Raw integer value.
    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for RecordId {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

/// One customer entity.
///
/// Field names match the JSON schema of the remote service. `id` is omitted
/// from serialized drafts so a create request never carries one.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address: String,
}

impl Record {
    /// Build a draft (no id) from its four editable fields.
    #[must_use]
    pub fn draft(
        name: impl Into<String>,
        email: impl Into<String>,
        phone: impl Into<String>,
        address: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            name: name.into(),
            email: email.into(),
            phone: phone.into(),
            address: address.into(),
        }
    }

    /// Attach a server-assigned id.
    #[must_use]
    pub fn with_id(mut self, id: RecordId) -> Self {
        self.id = Some(id);
        self
    }

    /// Whether this record has never been persisted.
    #[must_use]
    pub fn is_draft(&self) -> bool {
        self.id.is_none()
    }

    /// Copy of the editable fields with the id stripped.
    #[must_use]
    pub fn to_draft(&self) -> Self {
        Self {
            id: None,
            ..self.clone()
        }
    }

    /// Whether the editable fields match `other`, ignoring ids.
    #[must_use]
    pub fn same_fields(&self, other: &Record) -> bool {
        self.name == other.name
            && self.email == other.email
            && self.phone == other.phone
            && self.address == other.address
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn draft_serializes_without_id() {
        let draft = Record::draft("Ada", "ada@x.com", "1234567890", "1 Main St");
        let json = serde_json::to_string(&draft).unwrap();
        assert!(!json.contains("\"id\""));
        assert!(json.contains("\"name\":\"Ada\""));
    }

    #[test]
    fn persisted_record_parses_id() {
        let json = r#"{"id":7,"name":"Ada","email":"ada@x.com","phone":"1234567890","address":"1 Main St"}"#;
        let record: Record = serde_json::from_str(json).unwrap();
        assert_eq!(record.id, Some(RecordId(7)));
        assert!(!record.is_draft());
    }

    #[test]
    fn missing_fields_default_to_empty() {
        let record: Record = serde_json::from_str(r#"{"id":1}"#).unwrap();
        assert_eq!(record.name, "");
        assert_eq!(record.address, "");
    }

    #[test]
    fn same_fields_ignores_id() {
        let draft = Record::draft("Ada", "ada@x.com", "1234567890", "1 Main St");
        let saved = draft.clone().with_id(RecordId(3));
        assert!(saved.same_fields(&draft));
        assert_eq!(saved.to_draft(), draft);
    }

    #[test]
    fn null_id_is_a_draft() {
        let record: Record = serde_json::from_str(r#"{"id":null,"name":"x"}"#).unwrap();
        assert!(record.is_draft());
    }
}
