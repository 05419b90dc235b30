//! Dictionary Query Handlers

use std::sync::Arc;

use crate::application::error::ApplicationError;
use crate::application::ports::{DictionaryRecord, DictionaryRepositoryPort, WordCachePort};
use crate::application::queries::{ListWords, SuggestWords};

/// Discord 自动补全最多 25 个候选
pub const MAX_SUGGESTIONS: usize = 25;

const CSV_HEADER: [&str; 3] = ["ID", "単語", "読み"];

/// 渲染词典 CSV，行之间用 `\n` 分隔，无结尾换行
pub fn render_dictionary_csv(records: &[DictionaryRecord]) -> Result<String, ApplicationError> {
    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer.write_record(CSV_HEADER).map_err(csv_error)?;
    for record in records {
        let id = record.id.to_string();
        writer
            .write_record([id.as_str(), record.entry.word.as_str(), record.entry.reading.as_str()])
            .map_err(csv_error)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| ApplicationError::internal(format!("CSV flush failed: {}", e)))?;
    let mut csv = String::from_utf8(bytes)
        .map_err(|e| ApplicationError::internal(format!("CSV is not UTF-8: {}", e)))?;
    if csv.ends_with('\n') {
        csv.pop();
    }
    Ok(csv)
}

fn csv_error(err: csv::Error) -> ApplicationError {
    ApplicationError::internal(format!("CSV write failed: {}", err))
}

// ============================================================================
// ListWords
// ============================================================================

/// 词典导出响应
#[derive(Debug, Clone)]
pub struct ListWordsResponse {
    pub csv: String,
    pub count: usize,
}

/// ListWords Handler
pub struct ListWordsHandler {
    dictionary_repo: Arc<dyn DictionaryRepositoryPort>,
}

impl ListWordsHandler {
    pub fn new(dictionary_repo: Arc<dyn DictionaryRepositoryPort>) -> Self {
        Self { dictionary_repo }
    }

    pub async fn handle(&self, query: ListWords) -> Result<ListWordsResponse, ApplicationError> {
        let records = self.dictionary_repo.list(query.guild_id).await?;
        Ok(ListWordsResponse {
            csv: render_dictionary_csv(&records)?,
            count: records.len(),
        })
    }
}

// ============================================================================
// SuggestWords
// ============================================================================

/// SuggestWords Handler
pub struct SuggestWordsHandler {
    dictionary_repo: Arc<dyn DictionaryRepositoryPort>,
    word_cache: Arc<dyn WordCachePort>,
}

impl SuggestWordsHandler {
    pub fn new(
        dictionary_repo: Arc<dyn DictionaryRepositoryPort>,
        word_cache: Arc<dyn WordCachePort>,
    ) -> Self {
        Self {
            dictionary_repo,
            word_cache,
        }
    }

    pub async fn handle(&self, query: SuggestWords) -> Result<Vec<String>, ApplicationError> {
        let words = match self.word_cache.get(query.guild_id) {
            Some(words) if !words.is_empty() => words,
            _ => {
                let records = self.dictionary_repo.list(query.guild_id).await?;
                let words = records.into_iter().map(|r| r.entry.word).collect();
                self.word_cache.store(query.guild_id, words)
            }
        };

        Ok(words
            .iter()
            .filter(|word| word.starts_with(&query.prefix))
            .take(query.limit.min(MAX_SUGGESTIONS))
            .cloned()
            .collect())
    }
}
