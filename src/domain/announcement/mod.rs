//! Announcement Context - 入退室播报
//!
//! 职责:
//! - 语音状态快照与变化（VoiceTransition）
//! - 变化分类与日语文案
//! - 显示名 / 频道名解析

mod builder;
mod presence;

pub use builder::{build_announcement, classify, render, TransitionKind};
pub use presence::{
    resolve_channel_name, resolve_display_name, MemberProfile, VoicePresence, VoiceTransition,
    UNKNOWN_CHANNEL, UNKNOWN_USER,
};
