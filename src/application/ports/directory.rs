//! Directory Port - 成员 / 频道名缓存
//!
//! 由网关事件写入，会话只读

use crate::domain::announcement::MemberProfile;
use crate::domain::{ChannelId, GuildId, UserId};

pub trait DirectoryPort: Send + Sync {
    /// 获取成员资料
    fn member(&self, guild_id: GuildId, user_id: UserId) -> Option<MemberProfile>;

    /// 写入部分资料（如只有 User 的提及），与已有资料合并
    fn upsert_member(&self, guild_id: GuildId, user_id: UserId, profile: MemberProfile);

    /// 写入完整的成员资料，覆盖已有资料；缺失的昵称表示已被清除
    fn replace_member(&self, guild_id: GuildId, user_id: UserId, profile: MemberProfile);

    /// 获取频道名
    fn channel_name(&self, guild_id: GuildId, channel_id: ChannelId) -> Option<String>;

    /// 写入频道名
    fn upsert_channel(&self, guild_id: GuildId, channel_id: ChannelId, name: String);

    /// 删除频道
    fn remove_channel(&self, guild_id: GuildId, channel_id: ChannelId);
}
