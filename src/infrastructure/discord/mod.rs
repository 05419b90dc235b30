//! Discord Adapter
//!
//! serenity 网关事件 → 应用层命令 / 查询；斜杠命令定义与日语回复

mod commands;
mod handler;
mod replies;

pub use commands::{definitions, SlashCommand};
pub use handler::{BotServices, DiscordHandler};
pub use replies::Reply;
