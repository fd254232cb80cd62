use crate::domain_model::{Extra, NewSession, SessionRecord, generate_session_id};
use crate::domain_port::{SessionAdapter, SessionError};
use chrono::{DateTime, Utc};
use mongodb::bson::{self, Document, doc};
use mongodb::{Collection, Database};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

const DEFAULT_SESSION_COLLECTION: &str = "sessions";

/// One document per session. Extra creation fields are flattened in
/// verbatim next to the fixed ones.
#[derive(Debug, Serialize, Deserialize)]
struct SessionDocument {
    #[serde(rename = "_id")]
    id: String,
    #[serde(rename = "userId")]
    user_id: String,
    #[serde(rename = "expiresAt")]
    expires_at: bson::DateTime,
    #[serde(flatten)]
    extra: Document,
}

impl SessionDocument {
    fn from_record(record: &SessionRecord) -> Result<Self, SessionError> {
        Ok(SessionDocument {
            id: record.id.clone(),
            user_id: record.user_id.clone(),
            expires_at: bson::DateTime::from_millis(record.expires_at.timestamp_millis()),
            extra: bson::to_document(&record.extra)
                .map_err(|e| SessionError::backend("create session", e))?,
        })
    }

    fn into_record(self) -> Result<SessionRecord, SessionError> {
        let expires_at = DateTime::<Utc>::from_timestamp_millis(self.expires_at.timestamp_millis())
            .ok_or_else(|| SessionError::backend("get session", "expiry timestamp out of range"))?;
        let extra: Extra = self
            .extra
            .into_iter()
            .map(|(key, value)| (key, serde_json::Value::from(value)))
            .collect();

        Ok(SessionRecord {
            id: self.id,
            user_id: self.user_id,
            expires_at,
            extra,
        })
    }
}

/// Document-store adapter over a shared MongoDB database handle.
///
/// Sessions live in their own collection (default `"sessions"`); users are
/// the caller's collection, deserialized straight into `U`. Expiry policy:
/// eager: a read that observes an expired document deletes it and fails.
pub struct MongoSessionAdapter<U>
where
    U: DeserializeOwned + Send + Sync + 'static,
{
    sessions: Collection<SessionDocument>,
    users: Collection<U>,
}

impl<U> MongoSessionAdapter<U>
where
    U: DeserializeOwned + Send + Sync + 'static,
{
    pub fn new(db: &Database, user_collection: &str, session_collection: Option<&str>) -> Self {
        MongoSessionAdapter {
            sessions: db.collection(session_collection.unwrap_or(DEFAULT_SESSION_COLLECTION)),
            users: db.collection(user_collection),
        }
    }

    /// Build the client from a raw connection URI.
    pub async fn connect(
        uri: &str,
        db_name: &str,
        user_collection: &str,
        session_collection: Option<&str>,
    ) -> mongodb::error::Result<Self> {
        let client = mongodb::Client::with_uri_str(uri).await?;
        Ok(Self::new(
            &client.database(db_name),
            user_collection,
            session_collection,
        ))
    }

    async fn fetch_user(&self, user_id: &str) -> Result<U, SessionError> {
        let user = self
            .users
            .find_one(doc! { "_id": user_id })
            .await
            .map_err(|e| SessionError::backend("get user", e))?;
        user.ok_or(SessionError::UserNotFound)
    }
}

#[async_trait::async_trait]
impl<U> SessionAdapter<U> for MongoSessionAdapter<U>
where
    U: DeserializeOwned + Send + Sync + 'static,
{
    async fn create_session(&self, new: NewSession) -> Result<SessionRecord, SessionError> {
        let record = new.into_record(generate_session_id());
        let document = SessionDocument::from_record(&record)?;

        self.sessions
            .insert_one(&document)
            .await
            .map_err(|e| SessionError::backend("create session", e))?;

        Ok(record)
    }

    async fn get_session(&self, session_id: Option<&str>) -> Result<SessionRecord, SessionError> {
        let id = session_id.ok_or(SessionError::MissingSessionId)?;

        let document = self
            .sessions
            .find_one(doc! { "_id": id })
            .await
            .map_err(|e| SessionError::backend("get session", e))?;

        let record = document.ok_or(SessionError::SessionNotFound)?.into_record()?;
        if record.is_expired() {
            self.sessions
                .delete_one(doc! { "_id": id })
                .await
                .map_err(|e| SessionError::backend("get session", e))?;
            return Err(SessionError::SessionExpired);
        }

        Ok(record)
    }

    async fn get_user_by_session_id(&self, session_id: Option<&str>) -> Result<U, SessionError> {
        let session = self.get_session(session_id).await?;
        self.fetch_user(&session.user_id).await
    }

    async fn get_user_by_user_id(&self, user_id: Option<&str>) -> Result<U, SessionError> {
        let id = user_id.ok_or(SessionError::MissingUserId)?;
        self.fetch_user(id).await
    }

    async fn delete_session(&self, session_id: Option<&str>) -> Result<SessionRecord, SessionError> {
        let id = session_id.ok_or(SessionError::MissingSessionId)?;

        let document = self
            .sessions
            .find_one_and_delete(doc! { "_id": id })
            .await
            .map_err(|e| SessionError::backend("delete session", e))?;

        let record = document.ok_or(SessionError::SessionNotFound)?.into_record()?;
        if record.is_expired() {
            return Err(SessionError::SessionExpired);
        }
        Ok(record)
    }

    async fn delete_users_all_sessions(
        &self,
        session_id: Option<&str>,
    ) -> Result<u64, SessionError> {
        let session = self.get_session(session_id).await?;

        let result = self
            .sessions
            .delete_many(doc! { "userId": &session.user_id })
            .await
            .map_err(|e| SessionError::backend("delete all sessions", e))?;

        Ok(result.deleted_count)
    }
}
