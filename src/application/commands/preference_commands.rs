//! Preference Commands

use crate::domain::UserId;

/// 修改用户的合成参数，未指定的字段保持原值
#[derive(Debug, Clone)]
pub struct SetVoicePreference {
    pub user_id: UserId,
    pub voice: Option<String>,
    pub pitch: Option<f32>,
    pub speed: Option<f32>,
}
