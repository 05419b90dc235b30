//! In-Memory Session Registry Implementation

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::application::ports::{RegistryError, SessionRegistryPort};
use crate::application::session::VoiceSession;
use crate::domain::GuildId;

enum Slot {
    /// join 命令已占位，连接尚未就绪
    Connecting,
    Active(Arc<VoiceSession>),
}

/// 内存会话注册表
pub struct InMemorySessionRegistry {
    slots: DashMap<GuildId, Slot>,
}

impl InMemorySessionRegistry {
    pub fn new() -> Self {
        Self {
            slots: DashMap::new(),
        }
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }
}

impl Default for InMemorySessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionRegistryPort for InMemorySessionRegistry {
    fn reserve(&self, guild_id: GuildId) -> Result<(), RegistryError> {
        match self.slots.entry(guild_id) {
            Entry::Occupied(_) => Err(RegistryError::AlreadyExists(guild_id)),
            Entry::Vacant(vacant) => {
                vacant.insert(Slot::Connecting);
                tracing::debug!(guild_id = %guild_id, "Guild reserved for connection");
                Ok(())
            }
        }
    }

    fn register(&self, session: Arc<VoiceSession>) -> Result<(), RegistryError> {
        let guild_id = session.guild_id();
        match self.slots.entry(guild_id) {
            Entry::Occupied(mut occupied) => {
                if matches!(occupied.get(), Slot::Active(_)) {
                    return Err(RegistryError::AlreadyExists(guild_id));
                }
                occupied.insert(Slot::Active(session));
                tracing::info!(guild_id = %guild_id, "Session registered");
                Ok(())
            }
            Entry::Vacant(vacant) => {
                vacant.insert(Slot::Active(session));
                tracing::info!(guild_id = %guild_id, "Session registered");
                Ok(())
            }
        }
    }

    fn release(&self, guild_id: GuildId) {
        let released = self
            .slots
            .remove_if(&guild_id, |_, slot| matches!(slot, Slot::Connecting))
            .is_some();
        if released {
            tracing::debug!(guild_id = %guild_id, "Connection reservation released");
        }
    }

    fn get(&self, guild_id: GuildId) -> Option<Arc<VoiceSession>> {
        self.slots.get(&guild_id).and_then(|slot| match slot.value() {
            Slot::Active(session) => Some(session.clone()),
            Slot::Connecting => None,
        })
    }

    fn remove(&self, guild_id: GuildId, session_id: Uuid) -> bool {
        self.slots
            .remove_if(&guild_id, |_, slot| {
                matches!(slot, Slot::Active(session) if session.id() == session_id)
            })
            .is_some()
    }

    fn active_guilds(&self) -> Vec<GuildId> {
        self.slots
            .iter()
            .filter(|entry| matches!(entry.value(), Slot::Active(_)))
            .map(|entry| *entry.key())
            .collect()
    }
}
