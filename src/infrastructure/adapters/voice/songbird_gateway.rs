//! Songbird Gateway - 语音连接的 songbird 实现

use async_trait::async_trait;
use serenity::model::id::{ChannelId as SerenityChannelId, GuildId as SerenityGuildId};
use songbird::Songbird;
use std::sync::Arc;

use super::songbird_player::SongbirdPlayer;
use crate::application::ports::{
    AudioPlayerPort, TransportError, VoiceConnectionPort, VoiceGatewayPort,
};
use crate::domain::{ChannelId, GuildId};

fn to_serenity_guild(guild_id: GuildId) -> Result<SerenityGuildId, TransportError> {
    if guild_id.get() == 0 {
        return Err(TransportError::Join("guild id must be non-zero".to_string()));
    }
    Ok(SerenityGuildId::new(guild_id.get()))
}

/// 一条 songbird Call 及其播放器
pub struct SongbirdConnection {
    guild_id: GuildId,
    manager: Arc<Songbird>,
    player: Arc<SongbirdPlayer>,
}

#[async_trait]
impl VoiceConnectionPort for SongbirdConnection {
    fn player(&self) -> Arc<dyn AudioPlayerPort> {
        self.player.clone()
    }

    async fn disconnect(&self) -> Result<(), TransportError> {
        let guild = to_serenity_guild(self.guild_id).map_err(|e| TransportError::Leave(e.to_string()))?;
        self.manager
            .remove(guild)
            .await
            .map_err(|e| TransportError::Leave(e.to_string()))?;
        tracing::info!(guild_id = %self.guild_id, "Left voice channel");
        Ok(())
    }
}

/// songbird 语音网关
pub struct SongbirdGateway {
    manager: Arc<Songbird>,
}

impl SongbirdGateway {
    pub fn new(manager: Arc<Songbird>) -> Self {
        Self { manager }
    }
}

#[async_trait]
impl VoiceGatewayPort for SongbirdGateway {
    async fn join(
        &self,
        guild_id: GuildId,
        channel_id: ChannelId,
    ) -> Result<Box<dyn VoiceConnectionPort>, TransportError> {
        let guild = to_serenity_guild(guild_id)?;
        if channel_id.get() == 0 {
            return Err(TransportError::Join("channel id must be non-zero".to_string()));
        }

        let call = self
            .manager
            .join(guild, SerenityChannelId::new(channel_id.get()))
            .await
            .map_err(|e| TransportError::Join(e.to_string()))?;

        {
            let mut handler = call.lock().await;
            if let Err(e) = handler.deafen(true).await {
                tracing::debug!(guild_id = %guild_id, error = %e, "Self-deafen failed");
            }
        }

        tracing::info!(guild_id = %guild_id, channel_id = %channel_id, "Joined voice channel");
        Ok(Box::new(SongbirdConnection {
            guild_id,
            manager: self.manager.clone(),
            player: Arc::new(SongbirdPlayer::new(guild_id, call)),
        }))
    }

    async fn abandon(&self, guild_id: GuildId) {
        let Ok(guild) = to_serenity_guild(guild_id) else {
            return;
        };
        if let Err(e) = self.manager.remove(guild).await {
            tracing::debug!(guild_id = %guild_id, error = %e, "Nothing to abandon");
        }
    }
}
