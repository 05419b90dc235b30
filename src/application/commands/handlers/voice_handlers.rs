//! Voice Command Handlers - 会话的建立、销毁、跳过与消息朗读

use std::sync::Arc;
use uuid::Uuid;

use crate::application::commands::{JoinVoice, LeaveVoice, SkipSpeech, SpeakMessage};
use crate::application::error::ApplicationError;
use crate::application::ports::{
    DictionaryRepositoryPort, DirectoryPort, PreferenceRepositoryPort, SessionRegistryPort,
};
use crate::application::session::{SessionPorts, SessionSettings, VoiceSession};
use crate::domain::content::clean_content;
use crate::domain::voice::VoiceParameters;
use crate::domain::{apply_dictionary, ChannelId};

// ============================================================================
// JoinVoice
// ============================================================================

/// 加入语音频道响应
#[derive(Debug, Clone)]
pub struct JoinVoiceResponse {
    pub session_id: Uuid,
    pub voice_channel_id: ChannelId,
}

/// JoinVoice Handler
pub struct JoinVoiceHandler {
    ports: SessionPorts,
    settings: SessionSettings,
}

impl JoinVoiceHandler {
    pub fn new(ports: SessionPorts, settings: SessionSettings) -> Self {
        Self { ports, settings }
    }

    pub async fn handle(&self, command: JoinVoice) -> Result<JoinVoiceResponse, ApplicationError> {
        let guild_id = command.guild_id;

        if self.ports.registry.get(guild_id).is_some() {
            return Err(ApplicationError::AlreadyConnected(guild_id));
        }
        let voice_channel_id = command
            .invoker_voice_channel
            .ok_or(ApplicationError::NotInVoiceChannel)?;

        // 连接期间占位，防止并发的 join 重复连接
        self.ports.registry.reserve(guild_id)?;

        let session = Arc::new(VoiceSession::new(
            guild_id,
            voice_channel_id,
            command.text_channel_id,
            command.self_user_id,
            self.settings.clone(),
            self.ports.clone(),
        ));

        if let Err(e) = session.connect().await {
            self.ports.registry.release(guild_id);
            return Err(e.into());
        }

        tracing::info!(
            session_id = %session.id(),
            guild_id = %guild_id,
            voice_channel_id = %voice_channel_id,
            text_channel_id = %command.text_channel_id,
            "Joined voice channel"
        );

        Ok(JoinVoiceResponse {
            session_id: session.id(),
            voice_channel_id,
        })
    }
}

// ============================================================================
// LeaveVoice
// ============================================================================

/// LeaveVoice Handler
pub struct LeaveVoiceHandler {
    registry: Arc<dyn SessionRegistryPort>,
}

impl LeaveVoiceHandler {
    pub fn new(registry: Arc<dyn SessionRegistryPort>) -> Self {
        Self { registry }
    }

    pub async fn handle(&self, command: LeaveVoice) -> Result<ChannelId, ApplicationError> {
        let session = self
            .registry
            .get(command.guild_id)
            .ok_or(ApplicationError::NotConnected(command.guild_id))?;

        let voice_channel_id = session.voice_channel_id();
        session.destroy().await;
        Ok(voice_channel_id)
    }
}

// ============================================================================
// SkipSpeech
// ============================================================================

/// SkipSpeech Handler
pub struct SkipSpeechHandler {
    registry: Arc<dyn SessionRegistryPort>,
}

impl SkipSpeechHandler {
    pub fn new(registry: Arc<dyn SessionRegistryPort>) -> Self {
        Self { registry }
    }

    pub async fn handle(&self, command: SkipSpeech) -> Result<(), ApplicationError> {
        let session = self
            .registry
            .get(command.guild_id)
            .ok_or(ApplicationError::NotConnected(command.guild_id))?;

        session.stop().await?;
        Ok(())
    }
}

// ============================================================================
// SpeakMessage
// ============================================================================

/// 消息朗读结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpeakOutcome {
    /// 已朗读，携带实际送去合成的文本
    Spoken(String),
    /// 没有会话、不是会话的文本频道、作者是 Bot 或清理后为空
    Ignored,
}

/// SpeakMessage Handler
pub struct SpeakMessageHandler {
    registry: Arc<dyn SessionRegistryPort>,
    dictionary_repo: Arc<dyn DictionaryRepositoryPort>,
    preference_repo: Arc<dyn PreferenceRepositoryPort>,
    directory: Arc<dyn DirectoryPort>,
    default_params: VoiceParameters,
}

impl SpeakMessageHandler {
    pub fn new(
        registry: Arc<dyn SessionRegistryPort>,
        dictionary_repo: Arc<dyn DictionaryRepositoryPort>,
        preference_repo: Arc<dyn PreferenceRepositoryPort>,
        directory: Arc<dyn DirectoryPort>,
        default_params: VoiceParameters,
    ) -> Self {
        Self {
            registry,
            dictionary_repo,
            preference_repo,
            directory,
            default_params,
        }
    }

    pub async fn handle(&self, command: SpeakMessage) -> Result<SpeakOutcome, ApplicationError> {
        if command.author_is_bot {
            return Ok(SpeakOutcome::Ignored);
        }
        let Some(session) = self.registry.get(command.guild_id) else {
            return Ok(SpeakOutcome::Ignored);
        };
        if session.text_channel_id() != command.channel_id {
            return Ok(SpeakOutcome::Ignored);
        }

        let guild_id = command.guild_id;
        let cleaned = clean_content(
            &command.content,
            |user_id| {
                self.directory
                    .member(guild_id, user_id)
                    .and_then(|m| m.display_name().map(str::to_string))
            },
            |channel_id| self.directory.channel_name(guild_id, channel_id),
        );
        if cleaned.is_empty() {
            return Ok(SpeakOutcome::Ignored);
        }

        let entries = self.dictionary_repo.list(guild_id).await?;
        let text = apply_dictionary(&cleaned, entries.iter().map(|r| &r.entry));

        let params = self
            .preference_repo
            .find(command.author_id)
            .await?
            .unwrap_or_else(|| self.default_params.clone());

        tracing::debug!(
            guild_id = %guild_id,
            author_id = %command.author_id,
            text_len = text.len(),
            "Speaking chat message"
        );

        session.speak(&text, &params).await?;
        Ok(SpeakOutcome::Spoken(text))
    }
}
