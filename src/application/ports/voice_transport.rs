//! Voice Transport Port - 语音连接与播放器抽象
//!
//! 具体实现（songbird）在 infrastructure/adapters/voice 层

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::watch;

use super::AudioStream;
use crate::domain::{ChannelId, GuildId};

/// 语音连接错误
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Failed to join voice channel: {0}")]
    Join(String),

    #[error("Failed to leave voice channel: {0}")]
    Leave(String),
}

/// 播放错误
#[derive(Debug, Error)]
pub enum PlaybackError {
    #[error("Player rejected the audio source: {0}")]
    Rejected(String),
}

/// 播放器状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerStatus {
    /// 没有正在播放的音源
    Idle,
    /// 正在播放
    Playing,
}

/// 音频播放器：连接唯一的音频消费者
#[async_trait]
pub trait AudioPlayerPort: Send + Sync {
    /// 把字节流设为当前音源
    ///
    /// 返回前状态必须已经切换到 `Playing`，音源耗尽后切换回 `Idle`
    async fn play(&self, source: AudioStream) -> Result<(), PlaybackError>;

    /// 强制停止当前音源
    async fn stop(&self);

    /// 订阅播放器状态
    fn status(&self) -> watch::Receiver<PlayerStatus>;
}

/// 一条已就绪的语音连接
#[async_trait]
pub trait VoiceConnectionPort: Send + Sync {
    /// 连接上挂载的播放器
    fn player(&self) -> std::sync::Arc<dyn AudioPlayerPort>;

    /// 断开并释放连接
    async fn disconnect(&self) -> Result<(), TransportError>;
}

/// 语音网关：按 (guild, channel) 建立连接
#[async_trait]
pub trait VoiceGatewayPort: Send + Sync {
    /// 加入语音频道，在连接就绪后返回
    async fn join(
        &self,
        guild_id: GuildId,
        channel_id: ChannelId,
    ) -> Result<Box<dyn VoiceConnectionPort>, TransportError>;

    /// 放弃某个服务器上尚未就绪或残留的连接
    async fn abandon(&self, guild_id: GuildId);
}
