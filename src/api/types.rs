use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Review status of an object, as defined by the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjectStatus {
    #[serde(rename = "No Review")]
    NoReview,
    #[serde(rename = "Pending Review")]
    PendingReview,
    #[serde(rename = "Under Review")]
    UnderReview,
    #[serde(rename = "Require Changes")]
    RequireChanges,
    #[serde(rename = "Approved")]
    Approved,
}

impl ObjectStatus {
    pub fn all() -> &'static [ObjectStatus] {
        &[
            ObjectStatus::NoReview,
            ObjectStatus::PendingReview,
            ObjectStatus::UnderReview,
            ObjectStatus::RequireChanges,
            ObjectStatus::Approved,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ObjectStatus::NoReview => "No Review",
            ObjectStatus::PendingReview => "Pending Review",
            ObjectStatus::UnderReview => "Under Review",
            ObjectStatus::RequireChanges => "Require Changes",
            ObjectStatus::Approved => "Approved",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::all()
            .iter()
            .copied()
            .find(|s| s.as_str().eq_ignore_ascii_case(value.trim()))
    }

    /// The following status in display order, wrapping around.
    pub fn next(&self) -> Self {
        let all = Self::all();
        let idx = all.iter().position(|s| s == self).unwrap_or(0);
        all[(idx + 1) % all.len()]
    }
}

impl std::fmt::Display for ObjectStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A document object as returned by `GET /api/objects/{id}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ObjectInfo {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    /// Folder path inside the project. Older servers report it as `parent_id`.
    #[serde(default, alias = "parent_id")]
    pub path: Option<String>,
    #[serde(default)]
    pub status: Option<ObjectStatus>,
    #[serde(default)]
    pub update_date: Option<String>,
    /// Stored comment collection, decoded with [`crate::comments::decode_comments`].
    #[serde(default)]
    pub comments: Value,
    /// Base64 document bytes, only present when requested with `raw=1`.
    #[serde(default)]
    pub raw: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ObjectEnvelope {
    pub object: ObjectInfo,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ObjectListEnvelope {
    pub objects: Vec<ObjectInfo>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_server_values() {
        for status in ObjectStatus::all() {
            let json = serde_json::to_string(status).unwrap();
            assert_eq!(json, format!("\"{}\"", status.as_str()));
            assert_eq!(ObjectStatus::parse(status.as_str()), Some(*status));
        }
        assert_eq!(ObjectStatus::parse("approved"), Some(ObjectStatus::Approved));
        assert_eq!(ObjectStatus::parse("Rejected"), None);
    }

    #[test]
    fn next_wraps_around() {
        assert_eq!(ObjectStatus::NoReview.next(), ObjectStatus::PendingReview);
        assert_eq!(ObjectStatus::Approved.next(), ObjectStatus::NoReview);
    }

    #[test]
    fn object_envelope_accepts_server_shape() {
        let body = r#"{"object": {"id": "o1", "parent_id": "/specs", "user_id": 3,
            "project_id": 1, "name": "Design", "description": "", "raw": null,
            "comments": null, "version": "v2", "status": "Under Review"}}"#;
        let envelope: ObjectEnvelope = serde_json::from_str(body).unwrap();
        let object = envelope.object;
        assert_eq!(object.id, "o1");
        assert_eq!(object.path.as_deref(), Some("/specs"));
        assert_eq!(object.status, Some(ObjectStatus::UnderReview));
        assert!(object.comments.is_null());
        assert!(object.raw.is_none());
    }
}
