//! Session repository: bearer tokens binding a game identity to an optional
//! chat identity.
//!
//! The game identity is fixed at issue time; attach/detach only touch the chat
//! columns so linking never invalidates the primary login.

use crate::error::StorageError;
use crate::models::SessionRecord;
use crate::sqlite_pool::SqlitePoolManager;
use tracing::info;

#[derive(Clone)]
pub struct SessionRepository {
    pool_manager: SqlitePoolManager,
}

impl SessionRepository {
    pub async fn new(pool_manager: SqlitePoolManager) -> Result<Self, StorageError> {
        let repo = Self { pool_manager };
        repo.init().await?;
        Ok(repo)
    }

    async fn init(&self) -> Result<(), StorageError> {
        let pool = self.pool_manager.pool();

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS sessions (
                token TEXT PRIMARY KEY,
                game_id TEXT NOT NULL,
                display_name TEXT NOT NULL,
                avatar_url TEXT,
                chat_id TEXT,
                chat_username TEXT,
                created_at TEXT NOT NULL
            )
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_sessions_game_id ON sessions(game_id)",
        )
        .execute(pool)
        .await?;

        Ok(())
    }

    pub async fn insert(&self, session: &SessionRecord) -> Result<(), StorageError> {
        let pool = self.pool_manager.pool();

        sqlx::query(
            r#"
            INSERT INTO sessions (token, game_id, display_name, avatar_url, chat_id, chat_username, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&session.token)
        .bind(&session.game_id)
        .bind(&session.display_name)
        .bind(&session.avatar_url)
        .bind(&session.chat_id)
        .bind(&session.chat_username)
        .bind(session.created_at)
        .execute(pool)
        .await?;

        info!(game_id = %session.game_id, "Issued session");
        Ok(())
    }

    pub async fn find_by_token(&self, token: &str) -> Result<Option<SessionRecord>, StorageError> {
        let pool = self.pool_manager.pool();

        let session =
            sqlx::query_as::<_, SessionRecord>("SELECT * FROM sessions WHERE token = ?")
                .bind(token)
                .fetch_optional(pool)
                .await?;

        Ok(session)
    }

    /// Binds a chat identity to the session. Returns false for an unknown token.
    pub async fn attach_chat(
        &self,
        token: &str,
        chat_id: &str,
        chat_username: Option<&str>,
    ) -> Result<bool, StorageError> {
        let pool = self.pool_manager.pool();

        let result =
            sqlx::query("UPDATE sessions SET chat_id = ?, chat_username = ? WHERE token = ?")
                .bind(chat_id)
                .bind(chat_username)
                .bind(token)
                .execute(pool)
                .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Clears the chat identity; the game identity and token stay valid.
    pub async fn detach_chat(&self, token: &str) -> Result<bool, StorageError> {
        let pool = self.pool_manager.pool();

        let result =
            sqlx::query("UPDATE sessions SET chat_id = NULL, chat_username = NULL WHERE token = ?")
                .bind(token)
                .execute(pool)
                .await?;

        Ok(result.rows_affected() == 1)
    }

    pub async fn delete(&self, token: &str) -> Result<bool, StorageError> {
        let pool = self.pool_manager.pool();

        let result = sqlx::query("DELETE FROM sessions WHERE token = ?")
            .bind(token)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() == 1)
    }
}
