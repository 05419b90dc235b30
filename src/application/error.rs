//! 应用层错误定义
//!
//! 统一的命令/查询错误类型

use thiserror::Error;

use crate::application::session::{ConnectError, SpeakError};
use crate::domain::voice::VoiceError;
use crate::domain::GuildId;

/// 应用层错误
#[derive(Debug, Error)]
pub enum ApplicationError {
    /// 服务器已有会话（或正在连接）
    #[error("Guild {0} already has a voice session")]
    AlreadyConnected(GuildId),

    /// 调用者不在任何语音频道
    #[error("Invoker is not in a voice channel")]
    NotInVoiceChannel,

    /// 服务器没有会话
    #[error("Guild {0} has no voice session")]
    NotConnected(GuildId),

    /// 词典中没有该词条
    #[error("Word not found: {0}")]
    WordNotFound(String),

    /// 验证错误
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// 音色参数无效
    #[error(transparent)]
    InvalidVoice(#[from] VoiceError),

    /// 语音连接失败
    #[error(transparent)]
    Connect(#[from] ConnectError),

    /// 朗读失败
    #[error(transparent)]
    Speak(#[from] SpeakError),

    /// 仓储错误
    #[error("Repository error: {0}")]
    RepositoryError(String),

    /// 内部错误
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl ApplicationError {
    /// 创建验证错误
    pub fn validation(message: impl Into<String>) -> Self {
        Self::ValidationError(message.into())
    }

    /// 创建内部错误
    pub fn internal(message: impl Into<String>) -> Self {
        Self::InternalError(message.into())
    }
}

impl From<crate::application::ports::RepositoryError> for ApplicationError {
    fn from(err: crate::application::ports::RepositoryError) -> Self {
        Self::RepositoryError(err.to_string())
    }
}

impl From<crate::application::ports::RegistryError> for ApplicationError {
    fn from(err: crate::application::ports::RegistryError) -> Self {
        match err {
            crate::application::ports::RegistryError::AlreadyExists(guild_id) => {
                Self::AlreadyConnected(guild_id)
            }
        }
    }
}
