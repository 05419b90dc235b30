//! 领域层 - 纯逻辑，无 I/O
//!
//! - ids: Discord Snowflake 标识
//! - voice: 音色与合成参数
//! - dictionary: 读音词典替换
//! - announcement: 入退室播报的判定与文案
//! - content: 聊天消息清理

pub mod announcement;
pub mod content;
pub mod dictionary;
pub mod ids;
pub mod voice;

pub use dictionary::{apply_dictionary, DictionaryEntry};
pub use ids::{ChannelId, GuildId, UserId};
