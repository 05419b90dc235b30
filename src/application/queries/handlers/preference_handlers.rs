//! Preference Query Handlers

use std::sync::Arc;

use crate::application::error::ApplicationError;
use crate::application::ports::PreferenceRepositoryPort;
use crate::application::queries::GetVoicePreference;
use crate::domain::voice::VoiceParameters;

/// GetVoicePreference Handler
pub struct GetVoicePreferenceHandler {
    preference_repo: Arc<dyn PreferenceRepositoryPort>,
    default_params: VoiceParameters,
}

impl GetVoicePreferenceHandler {
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
        query: GetVoicePreference,
    ) -> Result<VoiceParameters, ApplicationError> {
        Ok(self
            .preference_repo
            .find(query.user_id)
            .await?
            .unwrap_or_else(|| self.default_params.clone()))
    }
}
