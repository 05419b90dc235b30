//! 读音词典 - 合成前的字面替换

use serde::{Deserialize, Serialize};

/// 单个词条：把 `word` 读作 `reading`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DictionaryEntry {
    pub word: String,
    pub reading: String,
}

impl DictionaryEntry {
    pub fn new(word: impl Into<String>, reading: impl Into<String>) -> Self {
        Self {
            word: word.into(),
            reading: reading.into(),
        }
    }
}

/// 按给定顺序依次做全局字面替换
///
/// 替换是链式的：前一条替换产生的文本会被后面的词条继续匹配，
/// 例如 `[("A","B"), ("B","C")]` 作用于 `"A"` 得到 `"C"`。
/// 空词条会被跳过（`str::replace` 对空模式会在每个字符间插入）。
pub fn apply_dictionary<'a, I>(text: &str, entries: I) -> String
where
    I: IntoIterator<Item = &'a DictionaryEntry>,
{
    entries
        .into_iter()
        .filter(|entry| !entry.word.is_empty())
        .fold(text.to_string(), |acc, entry| {
            acc.replace(&entry.word, &entry.reading)
        })
}
