//! 应用层 - 命令（写操作）
//!
//! CQRS 命令侧：处理所有写操作

mod dictionary_commands;
mod preference_commands;
mod voice_commands;

pub mod handlers;

pub use dictionary_commands::*;
pub use preference_commands::*;
pub use voice_commands::*;
