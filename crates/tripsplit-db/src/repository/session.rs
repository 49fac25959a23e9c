//! # Session Repository
//!
//! Sessions (trips) and their members.
//!
//! Membership is looked up here and handed to the validation pipeline as a
//! predicate; the split rules never query the database themselves.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use tripsplit_core::Session;

/// Repository for session database operations.
#[derive(Debug, Clone)]
pub struct SessionRepository {
    pool: SqlitePool,
}

impl SessionRepository {
    /// Creates a new SessionRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SessionRepository { pool }
    }

    /// Creates a session with a generated identifier.
    pub async fn create(&self, name: &str) -> DbResult<Session> {
        let session = Session {
            session_id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            created_at: Utc::now(),
        };

        debug!(session_id = %session.session_id, "Creating session");

        sqlx::query("INSERT INTO sessions (session_id, name, created_at) VALUES (?1, ?2, ?3)")
            .bind(&session.session_id)
            .bind(&session.name)
            .bind(session.created_at)
            .execute(&self.pool)
            .await?;

        Ok(session)
    }

    /// Gets a session by ID.
    pub async fn get(&self, session_id: &str) -> DbResult<Option<Session>> {
        let session = sqlx::query_as::<_, Session>(
            "SELECT session_id, name, created_at FROM sessions WHERE session_id = ?1",
        )
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(session)
    }

    /// Adds a member to a session.
    ///
    /// ## Errors
    /// - `UniqueViolation` if they are already a member
    /// - `ForeignKeyViolation` if the session does not exist
    pub async fn add_member(&self, session_id: &str, member_id: &str) -> DbResult<()> {
        debug!(session_id = %session_id, member_id = %member_id, "Adding session member");

        sqlx::query(
            "INSERT INTO session_members (session_id, member_id, joined_at) VALUES (?1, ?2, ?3)",
        )
        .bind(session_id)
        .bind(member_id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Lists a session's members in the order they joined.
    pub async fn member_ids(&self, session_id: &str) -> DbResult<Vec<String>> {
        let members: Vec<String> = sqlx::query_scalar(
            "SELECT member_id FROM session_members WHERE session_id = ?1 ORDER BY rowid",
        )
        .bind(session_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(members)
    }

    /// Deletes a session. Its members, expenditures and all of their child
    /// rows cascade.
    pub async fn delete(&self, session_id: &str) -> DbResult<()> {
        debug!(session_id = %session_id, "Deleting session");

        let result = sqlx::query("DELETE FROM sessions WHERE session_id = ?1")
            .bind(session_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Session", session_id));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};

    async fn setup() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let db = setup().await;
        let session = db.sessions().create("Kyoto 2026").await.unwrap();

        let loaded = db.sessions().get(&session.session_id).await.unwrap().unwrap();
        assert_eq!(loaded.name, "Kyoto 2026");

        assert!(db.sessions().get("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_membership() {
        let db = setup().await;
        let repo = db.sessions();
        let session = repo.create("Lisbon").await.unwrap();

        repo.add_member(&session.session_id, "bob").await.unwrap();
        repo.add_member(&session.session_id, "alice").await.unwrap();

        assert_eq!(
            repo.member_ids(&session.session_id).await.unwrap(),
            vec!["bob".to_string(), "alice".to_string()]
        );
    }

    #[tokio::test]
    async fn test_duplicate_member_rejected() {
        let db = setup().await;
        let repo = db.sessions();
        let session = repo.create("Lisbon").await.unwrap();

        repo.add_member(&session.session_id, "alice").await.unwrap();
        let err = repo.add_member(&session.session_id, "alice").await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[tokio::test]
    async fn test_member_of_missing_session_rejected() {
        let db = setup().await;
        let err = db.sessions().add_member("missing", "alice").await.unwrap_err();
        assert!(matches!(err, DbError::ForeignKeyViolation { .. }));
    }

    #[tokio::test]
    async fn test_delete() {
        let db = setup().await;
        let repo = db.sessions();
        let session = repo.create("Oslo").await.unwrap();
        repo.add_member(&session.session_id, "alice").await.unwrap();

        repo.delete(&session.session_id).await.unwrap();
        assert!(repo.get(&session.session_id).await.unwrap().is_none());
        assert!(repo.member_ids(&session.session_id).await.unwrap().is_empty());

        assert!(repo.delete(&session.session_id).await.unwrap_err().is_not_found());
    }
}
