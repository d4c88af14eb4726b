use serde::{Deserialize, Serialize};

/// Body of `GET /health`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    /// `"ok"` or `"unavailable"`.
    pub status: String,
    /// Number of stored notes, when the database answered.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<u64>,
}

impl HealthStatus {
    pub fn ok(notes: u64) -> Self {
        Self {
            status: "ok".to_string(),
            notes: Some(notes),
        }
    }

    pub fn unavailable() -> Self {
        Self {
            status: "unavailable".to_string(),
            notes: None,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == "ok"
    }
}
