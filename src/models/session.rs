use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Session record for a single request.
///
/// Built by the authentication middleware and carried through request
/// extensions, so handlers receive it explicitly instead of consulting any
/// process-wide flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id: Uuid,
    /// Who the request acts as: `"api-key"` for bearer-authenticated callers,
    /// `"anonymous"` when authentication is disabled.
    pub subject: String,
    pub authenticated: bool,
    pub started_at: DateTime<Utc>,
}

impl Session {
    pub fn anonymous() -> Self {
        Self::new("anonymous", false)
    }

    pub fn authenticated(subject: impl Into<String>) -> Self {
        Self::new(subject, true)
    }

    fn new(subject: impl Into<String>, authenticated: bool) -> Self {
        Self {
            id: Uuid::new_v4(),
            subject: subject.into(),
            authenticated,
            started_at: Utc::now(),
        }
    }
}
