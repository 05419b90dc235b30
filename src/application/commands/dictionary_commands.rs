//! Dictionary Commands

use crate::domain::GuildId;

/// 新增或更新读音
#[derive(Debug, Clone)]
pub struct PutWord {
    pub guild_id: GuildId,
    pub word: String,
    pub reading: String,
}

/// 删除读音
#[derive(Debug, Clone)]
pub struct DeleteWord {
    pub guild_id: GuildId,
    pub word: String,
}
