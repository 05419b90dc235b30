//! 斜杠命令的回复内容
//!
//! 只负责把应用层结果翻译成面向用户的日语文案和颜色，不做任何 I/O

use serenity::all::{CreateEmbed, EditInteractionResponse};

use crate::application::{ApplicationError, ConnectError, DictionaryRecord, SpeakError};
use crate::domain::voice::{VoiceParameters, KNOWN_VOICES};
use crate::domain::DictionaryEntry;

pub const SUCCESS_COLOUR: u32 = 0x00ff00;
pub const FAILURE_COLOUR: u32 = 0xff0000;
pub const PROGRESS_COLOUR: u32 = 0xffff00;

/// 一条嵌入式回复
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub title: Option<String>,
    pub description: String,
    pub colour: u32,
}

impl Reply {
    pub fn success(description: impl Into<String>) -> Self {
        Self {
            title: None,
            description: description.into(),
            colour: SUCCESS_COLOUR,
        }
    }

    pub fn failure(description: impl Into<String>) -> Self {
        Self {
            title: None,
            description: description.into(),
            colour: FAILURE_COLOUR,
        }
    }

    pub fn progress(description: impl Into<String>) -> Self {
        Self {
            title: None,
            description: description.into(),
            colour: PROGRESS_COLOUR,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn embed(&self) -> CreateEmbed {
        let embed = CreateEmbed::new()
            .description(&self.description)
            .colour(self.colour);
        match &self.title {
            Some(title) => embed.title(title),
            None => embed,
        }
    }

    /// 覆盖延迟回复的内容
    pub fn edit(&self) -> EditInteractionResponse {
        EditInteractionResponse::new().content("").embed(self.embed())
    }
}

pub fn connecting() -> Reply {
    Reply::progress("接続しています...")
}

pub fn connected() -> Reply {
    Reply::success("接続しました")
}

pub fn disconnected() -> Reply {
    Reply::success("切断しました")
}

pub fn skipped() -> Reply {
    Reply::success("読み上げをスキップしました")
}

pub fn word_put(record: &DictionaryRecord) -> Reply {
    Reply::success(format!(
        "単語: `{}`\n読み: `{}`",
        record.entry.word, record.entry.reading
    ))
    .with_title("辞書を編集しました")
}

pub fn word_deleted(entry: &DictionaryEntry) -> Reply {
    Reply::success(format!("単語: `{}`\n読み: `{}`", entry.word, entry.reading))
        .with_title("辞書を削除しました")
}

pub fn voice_preference(params: &VoiceParameters) -> Reply {
    Reply::success(format!(
        "声: `{}`\n高さ: `{}`\n速さ: `{}`",
        params.voice, params.pitch, params.speed
    ))
    .with_title("読み上げ設定")
}

pub fn guild_only() -> Reply {
    Reply::failure("このコマンドはサーバー内でのみ使用できます")
}

/// 应用层错误对应的回复
pub fn error(err: &ApplicationError) -> Reply {
    match err {
        ApplicationError::AlreadyConnected(_)
        | ApplicationError::Connect(ConnectError::AlreadyConnected(_)) => {
            Reply::failure("すでに Bot が別のボイスチャンネルに接続しています")
        }
        ApplicationError::NotInVoiceChannel => {
            Reply::failure("あなたはボイスチャンネルに接続していません")
        }
        ApplicationError::NotConnected(_) => {
            Reply::failure("Bot はボイスチャンネルに接続していません")
        }
        ApplicationError::WordNotFound(_) => {
            Reply::failure("単語が存在しません").with_title("エラーです")
        }
        ApplicationError::ValidationError(message) => {
            Reply::failure(format!("入力が正しくありません: {}", message))
        }
        ApplicationError::InvalidVoice(_) => Reply::failure(format!(
            "設定できない値です。声は {} から選び、高さと速さは 0.5 から 2.0 の間で指定してください",
            KNOWN_VOICES.join(" / ")
        )),
        ApplicationError::Connect(e) => {
            Reply::failure(format!("接続に失敗しました: \n```\n{}\n```", e))
        }
        ApplicationError::Speak(SpeakError::Cancelled) => {
            Reply::failure("読み上げがキャンセルされました")
        }
        other => Reply::failure(format!("エラーが発生しました: \n```\n{}\n```", other))
            .with_title("エラーです"),
    }
}
