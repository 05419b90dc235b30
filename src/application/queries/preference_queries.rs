//! Preference Queries

use crate::domain::UserId;

/// 获取用户当前的合成参数（未设置时为默认值）
#[derive(Debug, Clone)]
pub struct GetVoicePreference {
    pub user_id: UserId,
}
