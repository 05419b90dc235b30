//! Voice Session - Errors

use std::time::Duration;
use thiserror::Error;

use super::gate::GateCancelled;
use crate::application::ports::{PlaybackError, SynthesisError, TransportError};
use crate::domain::GuildId;

/// 连接失败：传输层没有进入就绪状态
#[derive(Debug, Error)]
pub enum ConnectError {
    #[error("Voice connection was not ready within {0:?}")]
    Timeout(Duration),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("Guild {0} already has an active voice session")]
    AlreadyConnected(GuildId),
}

/// 朗读失败
#[derive(Debug, Error)]
pub enum SpeakError {
    #[error(transparent)]
    Synthesis(#[from] SynthesisError),

    #[error(transparent)]
    Playback(#[from] PlaybackError),

    /// 播放器在限定时间内没有回到 Idle，已被强制停止
    #[error("Playback did not finish within {0:?}")]
    PlaybackTimeout(Duration),

    /// 被 stop / destroy 取消
    #[error("Speak job was cancelled")]
    Cancelled,

    #[error("Voice session is not connected")]
    NotConnected,
}

impl From<GateCancelled> for SpeakError {
    fn from(_: GateCancelled) -> Self {
        SpeakError::Cancelled
    }
}
