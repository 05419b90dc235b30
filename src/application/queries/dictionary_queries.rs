//! Dictionary Queries

use crate::domain::GuildId;

/// 导出服务器词典（CSV）
#[derive(Debug, Clone)]
pub struct ListWords {
    pub guild_id: GuildId,
}

/// 按前缀补全词条名
#[derive(Debug, Clone)]
pub struct SuggestWords {
    pub guild_id: GuildId,
    pub prefix: String,
    pub limit: usize,
}
