//! SQLite Voice Preference Repository

use async_trait::async_trait;
use chrono::Utc;
use sqlx::FromRow;

use super::DbPool;
use crate::application::ports::{PreferenceRepositoryPort, RepositoryError};
use crate::domain::voice::{VoiceName, VoiceParameters};
use crate::domain::UserId;

/// SQLite Preference Repository
pub struct SqlitePreferenceRepository {
    pool: DbPool,
}

impl SqlitePreferenceRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct PreferenceRow {
    voice: String,
    pitch: f64,
    speed: f64,
}

impl From<PreferenceRow> for VoiceParameters {
    fn from(row: PreferenceRow) -> Self {
        VoiceParameters {
            voice: VoiceName::from_stored(row.voice),
            pitch: row.pitch as f32,
            speed: row.speed as f32,
        }
    }
}

#[async_trait]
impl PreferenceRepositoryPort for SqlitePreferenceRepository {
    async fn find(&self, user_id: UserId) -> Result<Option<VoiceParameters>, RepositoryError> {
        let row: Option<PreferenceRow> = sqlx::query_as(
            "SELECT voice, pitch, speed FROM synthesizer_preferences WHERE user_id = ?",
        )
        .bind(user_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| RepositoryError::DatabaseError(e.to_string()))?;

        Ok(row.map(VoiceParameters::from))
    }

    async fn save(&self, user_id: UserId, params: &VoiceParameters) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO synthesizer_preferences (user_id, voice, pitch, speed, updated_at)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(user_id) DO UPDATE SET
                voice = excluded.voice,
                pitch = excluded.pitch,
                speed = excluded.speed,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(user_id.to_string())
        .bind(params.voice.as_str())
        .bind(f64::from(params.pitch))
        .bind(f64::from(params.speed))
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| RepositoryError::DatabaseError(e.to_string()))?;

        Ok(())
    }
}
