//! Word Cache Port - 词典词条名的缓存
//!
//! 自动补全频繁触发，避免每次按键都查询数据库。
//! 词典写入（put / delete）后必须失效对应服务器的缓存

use std::sync::Arc;

use crate::domain::GuildId;

pub trait WordCachePort: Send + Sync {
    /// 缓存中的词条名（按插入顺序）
    fn get(&self, guild_id: GuildId) -> Option<Arc<Vec<String>>>;

    fn store(&self, guild_id: GuildId, words: Vec<String>) -> Arc<Vec<String>>;

    fn invalidate(&self, guild_id: GuildId);
}
