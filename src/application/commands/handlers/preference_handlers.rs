//! Preference Command Handlers

use std::sync::Arc;

use crate::application::commands::SetVoicePreference;
use crate::application::error::ApplicationError;
use crate::application::ports::PreferenceRepositoryPort;
use crate::domain::voice::{VoiceName, VoiceParameters};

/// SetVoicePreference Handler
pub struct SetVoicePreferenceHandler {
    preference_repo: Arc<dyn PreferenceRepositoryPort>,
    default_params: VoiceParameters,
}

impl SetVoicePreferenceHandler {
    pub fn new(
        preference_repo: Arc<dyn PreferenceRepositoryPort>,
        default_params: VoiceParameters,
    ) -> Self {
        Self {
            preference_repo,
            default_params,
        }
    }

    pub async fn handle(
        &self,
        command: SetVoicePreference,
    ) -> Result<VoiceParameters, ApplicationError> {
        let mut params = self
            .preference_repo
            .find(command.user_id)
            .await?
            .unwrap_or_else(|| self.default_params.clone());

        if let Some(voice) = command.voice.as_deref() {
            params.voice = VoiceName::parse(voice)?;
        }
        if let Some(pitch) = command.pitch {
            params.pitch = pitch;
        }
        if let Some(speed) = command.speed {
            params.speed = speed;
        }
        params.validate()?;

        self.preference_repo.save(command.user_id, &params).await?;

        tracing::info!(
            user_id = %command.user_id,
            voice = %params.voice,
            pitch = params.pitch,
            speed = params.speed,
            "Voice preference updated"
        );

        Ok(params)
    }
}
