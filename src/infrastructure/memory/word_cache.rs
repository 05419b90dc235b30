//! In-Memory Word Cache

use dashmap::DashMap;
use std::sync::Arc;

use crate::application::ports::WordCachePort;
use crate::domain::GuildId;

pub struct InMemoryWordCache {
    words: DashMap<GuildId, Arc<Vec<String>>>,
}

impl InMemoryWordCache {
    pub fn new() -> Self {
        Self {
            words: DashMap::new(),
        }
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }
}

impl Default for InMemoryWordCache {
    fn default() -> Self {
        Self::new()
    }
}

impl WordCachePort for InMemoryWordCache {
    fn get(&self, guild_id: GuildId) -> Option<Arc<Vec<String>>> {
        self.words.get(&guild_id).map(|w| w.clone())
    }

    fn store(&self, guild_id: GuildId, words: Vec<String>) -> Arc<Vec<String>> {
        let words = Arc::new(words);
        self.words.insert(guild_id, words.clone());
        words
    }

    fn invalidate(&self, guild_id: GuildId) {
        if self.words.remove(&guild_id).is_some() {
            tracing::debug!(guild_id = %guild_id, "Word cache invalidated");
        }
    }
}
