//! Application repository: persistence and queries for whitelist applications.
//!
//! Uses SqlitePoolManager and the models (ApplicationRecord, HistoryQuery,
//! StatusSummary). External: SQLite via sqlx; callers use insert /
//! find_active_by_chat_id / transition / history etc.
//!
//! The `applications` table carries a partial unique index on chat_id over
//! active rows; it is the atomic backstop behind the submission gate's
//! check-then-create. The `transition` update is conditional on the row still
//! being pending, which closes the concurrent-reviewer race.

use crate::error::StorageError;
use crate::models::{ApplicationRecord, ApplicationStatus, HistoryQuery, StatusSummary};
use crate::sqlite_pool::SqlitePoolManager;
use chrono::Utc;
use tracing::info;

/// One page of history results plus filter-independent summary counts.
#[derive(Debug, Clone)]
pub struct HistoryPage {
    pub records: Vec<ApplicationRecord>,
    /// Total rows matching the identifier AND the status filter.
    pub total_filtered: i64,
    /// Counts across all of the identifier's rows, ignoring the filter.
    pub summary: StatusSummary,
}

#[derive(Clone)]
pub struct ApplicationRepository {
    pool_manager: SqlitePoolManager,
}

impl ApplicationRepository {
    pub async fn new(pool_manager: SqlitePoolManager) -> Result<Self, StorageError> {
        let repo = Self { pool_manager };
        repo.init().await?;
        Ok(repo)
    }

    /// Convenience constructor owning its own pool (tests, single-repo tools).
    pub async fn connect(database_url: &str) -> Result<Self, StorageError> {
        let pool_manager = SqlitePoolManager::new(database_url).await?;
        Self::new(pool_manager).await
    }

    async fn init(&self) -> Result<(), StorageError> {
        info!("Creating applications table if not exists");

        let pool = self.pool_manager.pool();

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS applications (
                id TEXT PRIMARY KEY,
                chat_id TEXT NOT NULL,
                game_id TEXT NOT NULL,
                character_name TEXT NOT NULL,
                birth_date TEXT NOT NULL,
                backstory TEXT NOT NULL,
                reason TEXT NOT NULL,
                status TEXT NOT NULL,
                reviewed_at TEXT,
                reviewer_id TEXT,
                reviewer_name TEXT,
                feedback TEXT NOT NULL DEFAULT '',
                notification_message_id TEXT,
                notification_channel_id TEXT,
                submitted_at TEXT NOT NULL,
                ip_address TEXT,
                user_agent TEXT
            )
            "#,
        )
        .execute(pool)
        .await?;

        // One active (pending or approved) application per chat identity.
        sqlx::query(
            r#"
            CREATE UNIQUE INDEX IF NOT EXISTS idx_applications_active_chat
                ON applications(chat_id) WHERE status IN ('pending', 'approved')
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_applications_chat_id ON applications(chat_id);
            CREATE INDEX IF NOT EXISTS idx_applications_game_id ON applications(game_id);
            CREATE INDEX IF NOT EXISTS idx_applications_status ON applications(status);
            CREATE INDEX IF NOT EXISTS idx_applications_submitted_at ON applications(submitted_at);
            "#,
        )
        .execute(pool)
        .await?;

        Ok(())
    }

    /// Inserts a new record. A concurrent duplicate active application for the
    /// same chat_id surfaces as [`StorageError::AlreadyExists`] from the
    /// partial unique index.
    pub async fn insert(&self, record: &ApplicationRecord) -> Result<(), StorageError> {
        let pool = self.pool_manager.pool();

        sqlx::query(
            r#"
            INSERT INTO applications (
                id, chat_id, game_id, character_name, birth_date, backstory, reason,
                status, reviewed_at, reviewer_id, reviewer_name, feedback,
                notification_message_id, notification_channel_id, submitted_at,
                ip_address, user_agent
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&record.id)
        .bind(&record.chat_id)
        .bind(&record.game_id)
        .bind(&record.character_name)
        .bind(record.birth_date)
        .bind(&record.backstory)
        .bind(&record.reason)
        .bind(record.status)
        .bind(record.reviewed_at)
        .bind(&record.reviewer_id)
        .bind(&record.reviewer_name)
        .bind(&record.feedback)
        .bind(&record.notification_message_id)
        .bind(&record.notification_channel_id)
        .bind(record.submitted_at)
        .bind(&record.ip_address)
        .bind(&record.user_agent)
        .execute(pool)
        .await?;

        info!(
            application_id = %record.id,
            chat_id = %record.chat_id,
            "Saved application"
        );
        Ok(())
    }

    pub async fn find_by_id(&self, id: &str) -> Result<Option<ApplicationRecord>, StorageError> {
        let pool = self.pool_manager.pool();

        let record =
            sqlx::query_as::<_, ApplicationRecord>("SELECT * FROM applications WHERE id = ?")
                .bind(id)
                .fetch_optional(pool)
                .await?;

        Ok(record)
    }

    /// Latest pending or approved record for a chat identity, if any.
    /// The submission gate asks this before allowing a new application.
    pub async fn find_active_by_chat_id(
        &self,
        chat_id: &str,
    ) -> Result<Option<ApplicationRecord>, StorageError> {
        let pool = self.pool_manager.pool();

        let record = sqlx::query_as::<_, ApplicationRecord>(
            r#"
            SELECT * FROM applications
            WHERE chat_id = ? AND status IN ('pending', 'approved')
            ORDER BY submitted_at DESC
            LIMIT 1
            "#,
        )
        .bind(chat_id)
        .fetch_optional(pool)
        .await?;

        Ok(record)
    }

    /// Most recent record for a game identity (status endpoint).
    pub async fn find_latest_by_game_id(
        &self,
        game_id: &str,
    ) -> Result<Option<ApplicationRecord>, StorageError> {
        let pool = self.pool_manager.pool();

        let record = sqlx::query_as::<_, ApplicationRecord>(
            "SELECT * FROM applications WHERE game_id = ? ORDER BY submitted_at DESC LIMIT 1",
        )
        .bind(game_id)
        .fetch_optional(pool)
        .await?;

        Ok(record)
    }

    /// Stores the chat-side message reference after a successful interactive post.
    pub async fn set_notification_ref(
        &self,
        id: &str,
        channel_id: &str,
        message_id: &str,
    ) -> Result<(), StorageError> {
        let pool = self.pool_manager.pool();

        sqlx::query(
            r#"
            UPDATE applications
            SET notification_channel_id = ?, notification_message_id = ?
            WHERE id = ?
            "#,
        )
        .bind(channel_id)
        .bind(message_id)
        .bind(id)
        .execute(pool)
        .await?;

        Ok(())
    }

    /// Atomically moves a still-pending record to a terminal status, stamping
    /// review metadata in the same statement. Returns false when the record was
    /// no longer pending (a concurrent reviewer won); the caller reloads and
    /// reports the current state instead of mutating anything.
    pub async fn transition(
        &self,
        id: &str,
        to: ApplicationStatus,
        reviewer_id: &str,
        reviewer_name: &str,
        feedback: &str,
    ) -> Result<bool, StorageError> {
        let pool = self.pool_manager.pool();

        let result = sqlx::query(
            r#"
            UPDATE applications
            SET status = ?, reviewed_at = ?, reviewer_id = ?, reviewer_name = ?, feedback = ?
            WHERE id = ? AND status = ?
            "#,
        )
        .bind(to)
        .bind(Utc::now())
        .bind(reviewer_id)
        .bind(reviewer_name)
        .bind(feedback)
        .bind(id)
        .bind(ApplicationStatus::Pending)
        .execute(pool)
        .await?;

        let applied = result.rows_affected() == 1;
        info!(
            application_id = %id,
            to = %to,
            applied = applied,
            "Transition attempted"
        );
        Ok(applied)
    }

    /// One page of an identity's applications, newest first, with
    /// filter-independent per-status counts. The identifier matches either
    /// identity column.
    pub async fn history(&self, query: &HistoryQuery) -> Result<HistoryPage, StorageError> {
        let pool = self.pool_manager.pool();
        let query = query.clone().normalized();

        let mut sql =
            String::from("SELECT * FROM applications WHERE (chat_id = ? OR game_id = ?)");
        if query.status.is_some() {
            sql.push_str(" AND status = ?");
        }
        sql.push_str(" ORDER BY submitted_at DESC LIMIT ? OFFSET ?");

        let mut rows = sqlx::query_as::<_, ApplicationRecord>(&sql)
            .bind(&query.identifier)
            .bind(&query.identifier);
        if let Some(status) = query.status {
            rows = rows.bind(status);
        }
        let records = rows
            .bind(query.limit)
            .bind(query.offset())
            .fetch_all(pool)
            .await?;

        let mut count_sql =
            String::from("SELECT COUNT(*) FROM applications WHERE (chat_id = ? OR game_id = ?)");
        if query.status.is_some() {
            count_sql.push_str(" AND status = ?");
        }
        let mut count = sqlx::query_as::<_, (i64,)>(&count_sql)
            .bind(&query.identifier)
            .bind(&query.identifier);
        if let Some(status) = query.status {
            count = count.bind(status);
        }
        let total_filtered = count.fetch_one(pool).await?.0;

        let summary = self.summary_for(&query.identifier).await?;

        info!(
            identifier = %query.identifier,
            page = query.page,
            returned = records.len(),
            total_filtered = total_filtered,
            "Retrieved application history"
        );

        Ok(HistoryPage {
            records,
            total_filtered,
            summary,
        })
    }

    /// Counts by status for everything the identifier has submitted.
    async fn summary_for(&self, identifier: &str) -> Result<StatusSummary, StorageError> {
        let pool = self.pool_manager.pool();

        let total: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM applications WHERE (chat_id = ? OR game_id = ?)",
        )
        .bind(identifier)
        .bind(identifier)
        .fetch_one(pool)
        .await?;

        let mut summary = StatusSummary {
            total: total.0,
            ..StatusSummary::default()
        };

        for status in [
            ApplicationStatus::Pending,
            ApplicationStatus::Approved,
            ApplicationStatus::Rejected,
        ] {
            let count: (i64,) = sqlx::query_as(
                "SELECT COUNT(*) FROM applications WHERE (chat_id = ? OR game_id = ?) AND status = ?",
            )
            .bind(identifier)
            .bind(identifier)
            .bind(status)
            .fetch_one(pool)
            .await?;

            match status {
                ApplicationStatus::Pending => summary.pending = count.0,
                ApplicationStatus::Approved => summary.approved = count.0,
                ApplicationStatus::Rejected => summary.rejected = count.0,
            }
        }

        Ok(summary)
    }
}
