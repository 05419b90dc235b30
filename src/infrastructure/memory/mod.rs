//! Memory Layer - In-Memory State Management
//!
//! 会话注册表、成员 / 频道目录、语音状态跟踪、词条缓存的内存实现

mod directory;
mod session_registry;
mod voice_state_tracker;
mod word_cache;

pub use directory::InMemoryDirectory;
pub use session_registry::InMemorySessionRegistry;
pub use voice_state_tracker::VoiceStateTracker;
pub use word_cache::InMemoryWordCache;
