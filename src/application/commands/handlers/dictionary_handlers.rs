//! Dictionary Command Handlers

use std::sync::Arc;

use crate::application::commands::{DeleteWord, PutWord};
use crate::application::error::ApplicationError;
use crate::application::ports::{DictionaryRecord, DictionaryRepositoryPort, WordCachePort};
use crate::domain::DictionaryEntry;

// ============================================================================
// PutWord
// ============================================================================

/// PutWord Handler
pub struct PutWordHandler {
    dictionary_repo: Arc<dyn DictionaryRepositoryPort>,
    word_cache: Arc<dyn WordCachePort>,
}

impl PutWordHandler {
    pub fn new(
        dictionary_repo: Arc<dyn DictionaryRepositoryPort>,
        word_cache: Arc<dyn WordCachePort>,
    ) -> Self {
        Self {
            dictionary_repo,
            word_cache,
        }
    }

    pub async fn handle(&self, command: PutWord) -> Result<DictionaryRecord, ApplicationError> {
        let word = command.word.trim();
        let reading = command.reading.trim();
        if word.is_empty() {
            return Err(ApplicationError::validation("word must not be empty"));
        }
        if reading.is_empty() {
            return Err(ApplicationError::validation("reading must not be empty"));
        }

        let record = self
            .dictionary_repo
            .upsert(command.guild_id, &DictionaryEntry::new(word, reading))
            .await?;
        self.word_cache.invalidate(command.guild_id);

        tracing::info!(
            guild_id = %command.guild_id,
            entry_id = record.id,
            word = %record.entry.word,
            "Dictionary entry saved"
        );

        Ok(record)
    }
}

// ============================================================================
// DeleteWord
// ============================================================================

/// DeleteWord Handler
pub struct DeleteWordHandler {
    dictionary_repo: Arc<dyn DictionaryRepositoryPort>,
    word_cache: Arc<dyn WordCachePort>,
}

impl DeleteWordHandler {
    pub fn new(
        dictionary_repo: Arc<dyn DictionaryRepositoryPort>,
        word_cache: Arc<dyn WordCachePort>,
    ) -> Self {
        Self {
            dictionary_repo,
            word_cache,
        }
    }

    pub async fn handle(&self, command: DeleteWord) -> Result<DictionaryEntry, ApplicationError> {
        let record = self
            .dictionary_repo
            .find(command.guild_id, &command.word)
            .await?
            .ok_or_else(|| ApplicationError::WordNotFound(command.word.clone()))?;

        self.dictionary_repo.delete(record.id).await?;
        self.word_cache.invalidate(command.guild_id);

        tracing::info!(
            guild_id = %command.guild_id,
            entry_id = record.id,
            word = %record.entry.word,
            "Dictionary entry deleted"
        );

        Ok(record.entry)
    }
}
