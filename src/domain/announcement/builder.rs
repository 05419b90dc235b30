//! 入退室播报的判定与文案

use crate::domain::{ChannelId, UserId};

use super::presence::{resolve_channel_name, resolve_display_name, MemberProfile, VoiceTransition};

/// 语音状态变化的分类
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionKind {
    /// 进入会话频道（包括从其他频道移动过来）
    Joined,
    /// 从会话频道移动到其他频道
    MovedTo(ChannelId),
    /// 从会话频道断开
    Left,
    /// 画面共有开始 / 结束
    ScreenShare(bool),
    /// 摄像头开启 / 关闭
    Camera(bool),
}

/// 判定一次变化属于哪一类
///
/// - `session_channel`: 会话所在的语音频道
/// - `self_user_id`: Bot 自己的账号，自己的变化永远不播报
///
/// 每次更新最多产生一条结果，画面共有优先于摄像头
pub fn classify(
    transition: &VoiceTransition,
    session_channel: ChannelId,
    self_user_id: UserId,
) -> Option<TransitionKind> {
    if transition.user_id == self_user_id {
        return None;
    }

    let previous = &transition.previous;
    let current = &transition.current;
    let here = Some(session_channel);

    match (previous.channel_id, current.channel_id) {
        (prev, cur) if prev != here && cur == here => Some(TransitionKind::Joined),
        (prev, Some(dest)) if prev == here && Some(dest) != here => {
            Some(TransitionKind::MovedTo(dest))
        }
        (prev, None) if prev == here => Some(TransitionKind::Left),
        (prev, cur) if prev == here && cur == here => {
            if previous.self_stream != current.self_stream {
                Some(TransitionKind::ScreenShare(current.self_stream))
            } else if previous.self_video != current.self_video {
                Some(TransitionKind::Camera(current.self_video))
            } else {
                None
            }
        }
        _ => None,
    }
}

/// 生成播报文案
///
/// `destination` 只在 `MovedTo` 时使用，应当已经解析为频道名或占位
pub fn render(kind: TransitionKind, display_name: &str, destination: &str) -> String {
    match kind {
        TransitionKind::Joined => format!("{} が入室しました", display_name),
        TransitionKind::MovedTo(_) => format!("{} が {} へ移動しました", display_name, destination),
        TransitionKind::Left => format!("{} が退出しました", display_name),
        TransitionKind::ScreenShare(true) => format!("{} が画面共有を開始しました", display_name),
        TransitionKind::ScreenShare(false) => format!("{} が画面共有を終了しました", display_name),
        TransitionKind::Camera(true) => format!("{} がカメラをオンにしました", display_name),
        TransitionKind::Camera(false) => format!("{} がカメラをオフにしました", display_name),
    }
}

/// 判定 + 名字解析 + 文案，一步得到可朗读的文本
///
/// 不匹配任何规则或是 Bot 自己时返回 None（不是错误）
pub fn build_announcement<F>(
    transition: &VoiceTransition,
    session_channel: ChannelId,
    self_user_id: UserId,
    member: Option<&MemberProfile>,
    channel_name: F,
) -> Option<String>
where
    F: FnOnce(ChannelId) -> Option<String>,
{
    let kind = classify(transition, session_channel, self_user_id)?;
    let display_name = resolve_display_name(member);
    let destination = match kind {
        TransitionKind::MovedTo(dest) => resolve_channel_name(channel_name(dest)),
        _ => String::new(),
    };
    Some(render(kind, &display_name, &destination))
}
