//! In-Memory Directory Implementation
//!
//! 成员资料和频道名的内存缓存，由网关事件填充

use dashmap::DashMap;
use std::sync::Arc;

use crate::application::ports::DirectoryPort;
use crate::domain::announcement::MemberProfile;
use crate::domain::{ChannelId, GuildId, UserId};

/// 内存目录
pub struct InMemoryDirectory {
    /// (guild, user) -> 成员资料
    members: DashMap<(GuildId, UserId), MemberProfile>,
    /// (guild, channel) -> 频道名
    channels: DashMap<(GuildId, ChannelId), String>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self {
            members: DashMap::new(),
            channels: DashMap::new(),
        }
    }

    pub fn arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// 服务器不可用或 Bot 被移出时清理
    pub fn forget_guild(&self, guild_id: GuildId) {
        self.members.retain(|(guild, _), _| *guild != guild_id);
        self.channels.retain(|(guild, _), _| *guild != guild_id);
        tracing::debug!(guild_id = %guild_id, "Directory entries dropped");
    }
}

impl Default for InMemoryDirectory {
    fn default() -> Self {
        Self::new()
    }
}

impl DirectoryPort for InMemoryDirectory {
    fn member(&self, guild_id: GuildId, user_id: UserId) -> Option<MemberProfile> {
        self.members.get(&(guild_id, user_id)).map(|p| p.clone())
    }

    fn upsert_member(&self, guild_id: GuildId, user_id: UserId, profile: MemberProfile) {
        self.members
            .entry((guild_id, user_id))
            .and_modify(|existing| existing.merge(profile.clone()))
            .or_insert(profile);
    }

    fn replace_member(&self, guild_id: GuildId, user_id: UserId, profile: MemberProfile) {
        self.members.insert((guild_id, user_id), profile);
    }

    fn channel_name(&self, guild_id: GuildId, channel_id: ChannelId) -> Option<String> {
        self.channels.get(&(guild_id, channel_id)).map(|n| n.clone())
    }

    fn upsert_channel(&self, guild_id: GuildId, channel_id: ChannelId, name: String) {
        self.channels.insert((guild_id, channel_id), name);
    }

    fn remove_channel(&self, guild_id: GuildId, channel_id: ChannelId) {
        self.channels.remove(&(guild_id, channel_id));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::announcement::resolve_display_name;

    #[test]
    fn test_member_upsert_merges() {
        let directory = InMemoryDirectory::new();
        let (guild, user) = (GuildId::new(1), UserId::new(2));

        directory.upsert_member(
            guild,
            user,
            MemberProfile {
                username: Some("taro".into()),
                ..Default::default()
            },
        );
        directory.upsert_member(
            guild,
            user,
            MemberProfile {
                nick: Some("たろう".into()),
                ..Default::default()
            },
        );

        let profile = directory.member(guild, user).unwrap();
        assert_eq!(profile.display_name(), Some("たろう"));
        assert_eq!(profile.username.as_deref(), Some("taro"));
        assert!(directory.member(GuildId::new(9), user).is_none());
    }

    #[test]
    fn test_cleared_nick_falls_back_to_username() {
        let directory = InMemoryDirectory::new();
        let (guild, user) = (GuildId::new(1), UserId::new(2));
        let member = |nick: Option<&str>| MemberProfile {
            user_id: Some(user),
            nick: nick.map(String::from),
            global_name: None,
            username: Some("user".into()),
        };

        directory.replace_member(guild, user, member(Some("old")));
        assert_eq!(resolve_display_name(directory.member(guild, user).as_ref()), "old");

        directory.replace_member(guild, user, member(None));
        assert_eq!(resolve_display_name(directory.member(guild, user).as_ref()), "user");

        // 只有 User 的部分资料不会带回昵称，也不会清掉全局名
        directory.replace_member(
            guild,
            user,
            MemberProfile {
                nick: Some("new".into()),
                global_name: Some("グローバル".into()),
                ..member(None)
            },
        );
        directory.upsert_member(guild, user, member(None));
        let profile = directory.member(guild, user).unwrap();
        assert_eq!(profile.nick.as_deref(), Some("new"));
        assert_eq!(profile.global_name.as_deref(), Some("グローバル"));
    }

    #[test]
    fn test_channels_and_forget_guild() {
        let directory = InMemoryDirectory::new();
        let guild = GuildId::new(1);
        directory.upsert_channel(guild, ChannelId::new(3), "雑談".into());
        directory.upsert_channel(GuildId::new(2), ChannelId::new(4), "別".into());

        assert_eq!(directory.channel_name(guild, ChannelId::new(3)).as_deref(), Some("雑談"));

        directory.forget_guild(guild);
        assert!(directory.channel_name(guild, ChannelId::new(3)).is_none());
        assert!(directory.channel_name(GuildId::new(2), ChannelId::new(4)).is_some());

        directory.remove_channel(GuildId::new(2), ChannelId::new(4));
        assert!(directory.channel_name(GuildId::new(2), ChannelId::new(4)).is_none());
    }
}
