use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Arbitrary caller-supplied fields carried alongside a session.
pub type Extra = serde_json::Map<String, serde_json::Value>;

/// A persisted session: a time-bounded proof of authentication tied to one
/// user identifier. Valid iff the current time is before `expires_at`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionRecord {
    pub id: String,
    pub user_id: String,
    pub expires_at: DateTime<Utc>,
    #[serde(flatten)]
    pub extra: Extra,
}

impl SessionRecord {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }
}

/// Creation options for a new session. `expires_at` is an absolute instant,
/// already resolved (see [`Expires`](crate::domain_model::Expires)).
///
/// This is also the exact JSON value the cache backend stores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSession {
    pub user_id: String,
    pub expires_at: DateTime<Utc>,
    #[serde(flatten)]
    pub extra: Extra,
}

impl NewSession {
    pub fn new(user_id: impl Into<String>, expires_at: DateTime<Utc>) -> Self {
        NewSession {
            user_id: user_id.into(),
            expires_at,
            extra: Extra::new(),
        }
    }

    pub fn with_extra(
        mut self,
        key: impl Into<String>,
        value: impl Into<serde_json::Value>,
    ) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    pub fn into_record(self, id: String) -> SessionRecord {
        SessionRecord {
            id,
            user_id: self.user_id,
            expires_at: self.expires_at,
            extra: self.extra,
        }
    }
}

pub fn generate_session_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
