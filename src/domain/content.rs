//! 聊天消息清理 - 去掉不可朗读的格式
//!
//! 提及、频道链接、自定义表情和 URL 在字典替换之前处理

use regex::{Captures, Regex};
use std::sync::OnceLock;

use super::{ChannelId, UserId};
use crate::domain::announcement::{UNKNOWN_CHANNEL, UNKNOWN_USER};

const URL_READING: &str = "URL省略";
const ROLE_READING: &str = "@ロール";

fn user_mention() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<@!?(\d+)>").expect("valid user mention pattern"))
}

fn channel_mention() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<#(\d+)>").expect("valid channel mention pattern"))
}

fn role_mention() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<@&\d+>").expect("valid role mention pattern"))
}

fn custom_emoji() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<a?:(\w+):\d+>").expect("valid emoji pattern"))
}

fn url() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"https?://\S+").expect("valid url pattern"))
}

fn snowflake(caps: &Captures<'_>) -> Option<u64> {
    caps.get(1).and_then(|m| m.as_str().parse().ok())
}

/// 清理消息文本
///
/// - `<@id>` / `<@!id>` → `@显示名`
/// - `<#id>` → `#频道名`
/// - `<@&id>` → `@ロール`
/// - `<:name:id>` → `name`
/// - URL → `URL省略`
pub fn clean_content<U, C>(text: &str, user_name: U, channel_name: C) -> String
where
    U: Fn(UserId) -> Option<String>,
    C: Fn(ChannelId) -> Option<String>,
{
    let text = url().replace_all(text, URL_READING);
    let text = user_mention().replace_all(&text, |caps: &Captures<'_>| {
        let name = snowflake(caps)
            .and_then(|id| user_name(UserId::new(id)))
            .unwrap_or_else(|| UNKNOWN_USER.to_string());
        format!("@{}", name)
    });
    let text = channel_mention().replace_all(&text, |caps: &Captures<'_>| {
        let name = snowflake(caps)
            .and_then(|id| channel_name(ChannelId::new(id)))
            .unwrap_or_else(|| UNKNOWN_CHANNEL.to_string());
        format!("#{}", name)
    });
    let text = role_mention().replace_all(&text, ROLE_READING);
    let text = custom_emoji().replace_all(&text, "$1");

    text.trim().to_string()
}
