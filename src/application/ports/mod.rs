//! Application Ports - 出站端口定义
//!
//! 定义应用层与基础设施层的抽象接口

mod directory;
mod repositories;
mod session_registry;
mod synthesizer;
mod voice_transport;
mod word_cache;

pub use directory::DirectoryPort;
pub use repositories::{
    DictionaryRecord, DictionaryRepositoryPort, PreferenceRepositoryPort, RepositoryError,
};
pub use session_registry::{RegistryError, SessionRegistryPort};
pub use synthesizer::{AudioStream, SynthesisError, SynthesisRequest, SynthesizerPort};
pub use voice_transport::{
    AudioPlayerPort, PlaybackError, PlayerStatus, TransportError, VoiceConnectionPort,
    VoiceGatewayPort,
};
pub use word_cache::WordCachePort;
