//! 应用层 - 用例编排
//!
//! 包含：
//! - ports: 六边形架构端口定义（Synthesizer、VoiceGateway、Repository、SessionRegistry 等）
//! - session: 服务器级语音会话与朗读队列
//! - commands: CQRS 命令及处理器
//! - queries: CQRS 查询及处理器
//! - error: 应用层错误定义

pub mod commands;
pub mod error;
pub mod ports;
pub mod queries;
pub mod session;

// Re-exports
pub use commands::{
    // Voice commands
    JoinVoice,
    LeaveVoice,
    SkipSpeech,
    SpeakMessage,
    // Dictionary commands
    DeleteWord,
    PutWord,
    // Preference commands
    SetVoicePreference,
    // Handlers
    handlers::{
        DeleteWordHandler, JoinVoiceHandler, JoinVoiceResponse, LeaveVoiceHandler,
        PutWordHandler, SetVoicePreferenceHandler, SkipSpeechHandler, SpeakMessageHandler,
        SpeakOutcome,
    },
};

pub use error::ApplicationError;

pub use ports::{
    // Voice transport
    AudioPlayerPort,
    PlaybackError,
    PlayerStatus,
    TransportError,
    VoiceConnectionPort,
    VoiceGatewayPort,
    // Synthesizer
    AudioStream,
    SynthesisError,
    SynthesisRequest,
    SynthesizerPort,
    // Repositories
    DictionaryRecord,
    DictionaryRepositoryPort,
    PreferenceRepositoryPort,
    RepositoryError,
    // Session registry
    RegistryError,
    SessionRegistryPort,
    // Directory & cache
    DirectoryPort,
    WordCachePort,
};

pub use queries::{
    GetVoicePreference,
    ListWords,
    SuggestWords,
    // Handlers
    handlers::{
        GetVoicePreferenceHandler, ListWordsHandler, ListWordsResponse, SuggestWordsHandler,
        MAX_SUGGESTIONS,
    },
};

pub use session::{ConnectError, SessionPorts, SessionSettings, SpeakError, VoiceSession};
