//! Voice Commands - 语音会话相关命令

use crate::domain::{ChannelId, GuildId, UserId};

/// 加入调用者所在的语音频道
#[derive(Debug, Clone)]
pub struct JoinVoice {
    pub guild_id: GuildId,
    /// 调用者当前所在的语音频道，不在语音中时为 None
    pub invoker_voice_channel: Option<ChannelId>,
    /// 发出命令的文本频道，之后只朗读这里的消息
    pub text_channel_id: ChannelId,
    /// Bot 自己的账号
    pub self_user_id: UserId,
}

/// 离开语音频道
#[derive(Debug, Clone)]
pub struct LeaveVoice {
    pub guild_id: GuildId,
}

/// 跳过正在朗读和排队中的内容
#[derive(Debug, Clone)]
pub struct SkipSpeech {
    pub guild_id: GuildId,
}

/// 朗读一条聊天消息
#[derive(Debug, Clone)]
pub struct SpeakMessage {
    pub guild_id: GuildId,
    pub channel_id: ChannelId,
    pub author_id: UserId,
    pub author_is_bot: bool,
    /// 原始消息内容（含 mention 等标记）
    pub content: String,
}
