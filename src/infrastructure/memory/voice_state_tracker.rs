//! Voice State Tracker
//!
//! 记录每个成员最后一次的语音状态，用于还原 "变化前" 的快照，
//! 以及 join 命令查找调用者所在的语音频道

use dashmap::DashMap;

use crate::domain::announcement::{VoicePresence, VoiceTransition};
use crate::domain::{ChannelId, GuildId, UserId};

pub struct VoiceStateTracker {
    states: DashMap<(GuildId, UserId), VoicePresence>,
}

impl VoiceStateTracker {
    pub fn new() -> Self {
        Self {
            states: DashMap::new(),
        }
    }

    /// 写入新状态并返回这次变化（旧状态缺失时视为未连接）
    pub fn apply(&self, guild_id: GuildId, user_id: UserId, current: VoicePresence) -> VoiceTransition {
        let key = (guild_id, user_id);
        let previous = if current.channel_id.is_some() {
            self.states.insert(key, current.clone())
        } else {
            self.states.remove(&key).map(|(_, presence)| presence)
        }
        .unwrap_or_default();

        VoiceTransition {
            guild_id,
            user_id,
            previous,
            current,
        }
    }

    /// 初始填充（guild_create），不产生变化
    pub fn seed(&self, guild_id: GuildId, user_id: UserId, presence: VoicePresence) {
        if presence.channel_id.is_some() {
            self.states.insert((guild_id, user_id), presence);
        }
    }

    /// 成员当前所在的语音频道
    pub fn channel_of(&self, guild_id: GuildId, user_id: UserId) -> Option<ChannelId> {
        self.states
            .get(&(guild_id, user_id))
            .and_then(|presence| presence.channel_id)
    }

    pub fn forget_guild(&self, guild_id: GuildId) {
        self.states.retain(|(guild, _), _| *guild != guild_id);
    }
}

impl Default for VoiceStateTracker {
    fn default() -> Self {
        Self::new()
    }
}
