//! Session Registry Port - 服务器 → 语音会话
//!
//! 定义会话注册表的抽象接口，具体实现在 infrastructure/memory 层

use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

use crate::application::session::VoiceSession;
use crate::domain::GuildId;

/// Session Registry 错误
#[derive(Debug, Error)]
pub enum RegistryError {
    /// 该服务器已有会话（或正在连接）
    #[error("Session already exists for guild {0}")]
    AlreadyExists(GuildId),
}

/// Session Registry Port
///
/// "该服务器是否已连接" 的唯一事实来源。
/// 只在会话构造/注册和销毁时修改，所有操作都是原子的检查并设置
pub trait SessionRegistryPort: Send + Sync {
    /// 为即将连接的服务器占位；已有占位或活跃会话时失败
    fn reserve(&self, guild_id: GuildId) -> Result<(), RegistryError>;

    /// 登记已就绪的会话，占位会被替换为活跃会话
    fn register(&self, session: Arc<VoiceSession>) -> Result<(), RegistryError>;

    /// 撤销占位（连接失败时），不影响活跃会话
    fn release(&self, guild_id: GuildId);

    /// 获取活跃会话
    fn get(&self, guild_id: GuildId) -> Option<Arc<VoiceSession>>;

    /// 移除活跃会话；只有 id 匹配时才移除，重复调用无副作用
    fn remove(&self, guild_id: GuildId, session_id: Uuid) -> bool;

    /// 所有活跃会话所在的服务器
    fn active_guilds(&self) -> Vec<GuildId>;
}
