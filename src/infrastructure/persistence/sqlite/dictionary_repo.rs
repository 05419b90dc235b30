//! SQLite Dictionary Repository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::FromRow;

use super::DbPool;
use crate::application::ports::{DictionaryRecord, DictionaryRepositoryPort, RepositoryError};
use crate::domain::{DictionaryEntry, GuildId};

/// SQLite Dictionary Repository
pub struct SqliteDictionaryRepository {
    pool: DbPool,
}

impl SqliteDictionaryRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct DictionaryRow {
    id: i64,
    guild_id: String,
    word: String,
    reading: String,
    created_at: String,
}

impl TryFrom<DictionaryRow> for DictionaryRecord {
    type Error = RepositoryError;

    fn try_from(row: DictionaryRow) -> Result<Self, Self::Error> {
        Ok(DictionaryRecord {
            id: row.id,
            guild_id: row
                .guild_id
                .parse::<u64>()
                .map(GuildId::new)
                .map_err(|e| RepositoryError::SerializationError(e.to_string()))?,
            entry: DictionaryEntry::new(row.word, row.reading),
            created_at: DateTime::parse_from_rfc3339(&row.created_at)
                .map_err(|e| RepositoryError::SerializationError(e.to_string()))?
                .with_timezone(&Utc),
        })
    }
}

#[async_trait]
impl DictionaryRepositoryPort for SqliteDictionaryRepository {
    async fn upsert(
        &self,
        guild_id: GuildId,
        entry: &DictionaryEntry,
    ) -> Result<DictionaryRecord, RepositoryError> {
        let row: DictionaryRow = sqlx::query_as(
            r#"
            INSERT INTO dictionaries (guild_id, word, reading, created_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(guild_id, word) DO UPDATE SET
                reading = excluded.reading
            RETURNING id, guild_id, word, reading, created_at
            "#,
        )
        .bind(guild_id.to_string())
        .bind(&entry.word)
        .bind(&entry.reading)
        .bind(Utc::now().to_rfc3339())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| RepositoryError::DatabaseError(e.to_string()))?;

        DictionaryRecord::try_from(row)
    }

    async fn find(
        &self,
        guild_id: GuildId,
        word: &str,
    ) -> Result<Option<DictionaryRecord>, RepositoryError> {
        let row: Option<DictionaryRow> = sqlx::query_as(
            "SELECT id, guild_id, word, reading, created_at FROM dictionaries WHERE guild_id = ? AND word = ?",
        )
        .bind(guild_id.to_string())
        .bind(word)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepositoryError::DatabaseError(e.to_string()))?;

        row.map(DictionaryRecord::try_from).transpose()
    }

    async fn list(&self, guild_id: GuildId) -> Result<Vec<DictionaryRecord>, RepositoryError> {
        let rows: Vec<DictionaryRow> = sqlx::query_as(
            "SELECT id, guild_id, word, reading, created_at FROM dictionaries WHERE guild_id = ? ORDER BY id ASC",
        )
        .bind(guild_id.to_string())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepositoryError::DatabaseError(e.to_string()))?;

        rows.into_iter().map(DictionaryRecord::try_from).collect()
    }

    async fn delete(&self, id: i64) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM dictionaries WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| RepositoryError::DatabaseError(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound(format!("dictionary entry {}", id)));
        }
        Ok(())
    }
}
