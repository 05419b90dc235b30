//! 语音状态快照与成员资料

use serde::{Deserialize, Serialize};

use crate::domain::{ChannelId, GuildId, UserId};

/// 解析不到名字时的占位
pub const UNKNOWN_USER: &str = "不明なユーザー";
pub const UNKNOWN_CHANNEL: &str = "不明なチャンネル";

/// 某个用户在某个服务器里的语音状态快照
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoicePresence {
    /// 所在语音频道，未连接时为 None
    pub channel_id: Option<ChannelId>,
    /// 是否正在画面共有（Go Live）
    pub self_stream: bool,
    /// 是否开启摄像头
    pub self_video: bool,
}

impl VoicePresence {
    pub fn in_channel(channel_id: ChannelId) -> Self {
        Self {
            channel_id: Some(channel_id),
            ..Default::default()
        }
    }

    pub fn disconnected() -> Self {
        Self::default()
    }

    pub fn streaming(mut self, on: bool) -> Self {
        self.self_stream = on;
        self
    }

    pub fn video(mut self, on: bool) -> Self {
        self.self_video = on;
        self
    }
}

/// 单个用户在单个服务器里的一次语音状态变化
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoiceTransition {
    pub guild_id: GuildId,
    pub user_id: UserId,
    /// 没有缓存过的旧状态按未连接处理
    pub previous: VoicePresence,
    pub current: VoicePresence,
}

/// 成员资料，用于解析显示名
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberProfile {
    pub user_id: Option<UserId>,
    /// 服务器昵称
    pub nick: Option<String>,
    /// 全局显示名
    pub global_name: Option<String>,
    /// 账号用户名
    pub username: Option<String>,
}

impl MemberProfile {
    /// 昵称 → 全局显示名 → 用户名
    pub fn display_name(&self) -> Option<&str> {
        [&self.nick, &self.global_name, &self.username]
            .into_iter()
            .flatten()
            .map(String::as_str)
            .find(|name| !name.is_empty())
    }

    /// 用新的资料覆盖已知字段，缺失字段保留旧值
    pub fn merge(&mut self, other: MemberProfile) {
        if other.user_id.is_some() {
            self.user_id = other.user_id;
        }
        if other.nick.is_some() {
            self.nick = other.nick;
        }
        if other.global_name.is_some() {
            self.global_name = other.global_name;
        }
        if other.username.is_some() {
            self.username = other.username;
        }
    }
}

/// 显示名解析，带占位
pub fn resolve_display_name(profile: Option<&MemberProfile>) -> String {
    profile
        .and_then(MemberProfile::display_name)
        .unwrap_or(UNKNOWN_USER)
        .to_string()
}

/// 频道名解析，带占位
pub fn resolve_channel_name(name: Option<String>) -> String {
    name.filter(|n| !n.is_empty())
        .unwrap_or_else(|| UNKNOWN_CHANNEL.to_string())
}
