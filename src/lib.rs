//! OHNO - Discord 读み上げ Bot
//!
//! 架构设计: DDD + CQRS + Hexagonal Architecture
//!
//! 领域层 (domain/):
//! - ids: Discord Snowflake
//! - voice: 音色与合成参数
//! - dictionary / content: 词典替换、消息清理
//! - announcement: 入退室播报
//!
//! 应用层 (application/):
//! - Ports: 端口定义（Synthesizer, VoiceGateway, SessionRegistry, Directory, Repositories）
//! - Session: 每个服务器一个的语音会话，串行化朗读
//! - Commands: CQRS 命令处理器
//! - Queries: CQRS 查询处理器
//!
//! 基础设施层 (infrastructure/):
//! - Discord: serenity 事件处理、斜杠命令
//! - Adapters: Azure 语音合成客户端、songbird 语音连接
//! - Memory: 会话注册表、成员目录、语音状态缓存
//! - Persistence: SQLite 词典与用户设置

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

#[cfg(test)]
mod test_support;

pub use config::{load_config, AppConfig};
