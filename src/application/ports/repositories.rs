//! Repository Ports - 出站端口
//!
//! 定义数据持久化的抽象接口
//! 具体实现在 infrastructure 层（SQLite）

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::domain::voice::VoiceParameters;
use crate::domain::{DictionaryEntry, GuildId, UserId};

/// Repository 错误
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Entity not found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

// ============================================================================
// Dictionary Repository
// ============================================================================

/// 词典词条（用于持久化）
#[derive(Debug, Clone)]
pub struct DictionaryRecord {
    pub id: i64,
    pub guild_id: GuildId,
    pub entry: DictionaryEntry,
    pub created_at: DateTime<Utc>,
}

/// Dictionary Repository Port
#[async_trait]
pub trait DictionaryRepositoryPort: Send + Sync {
    /// 新增或更新读音，(guild, word) 唯一
    async fn upsert(
        &self,
        guild_id: GuildId,
        entry: &DictionaryEntry,
    ) -> Result<DictionaryRecord, RepositoryError>;

    /// 查找单个词条
    async fn find(
        &self,
        guild_id: GuildId,
        word: &str,
    ) -> Result<Option<DictionaryRecord>, RepositoryError>;

    /// 按插入顺序列出服务器的全部词条（替换顺序即此顺序）
    async fn list(&self, guild_id: GuildId) -> Result<Vec<DictionaryRecord>, RepositoryError>;

    /// 删除词条
    async fn delete(&self, id: i64) -> Result<(), RepositoryError>;
}

// ============================================================================
// Voice Preference Repository
// ============================================================================

/// Voice Preference Repository Port
///
/// 每个用户的合成参数，每次朗读都重新读取，不缓存
#[async_trait]
pub trait PreferenceRepositoryPort: Send + Sync {
    async fn find(&self, user_id: UserId) -> Result<Option<VoiceParameters>, RepositoryError>;

    async fn save(&self, user_id: UserId, params: &VoiceParameters) -> Result<(), RepositoryError>;
}
