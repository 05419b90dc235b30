//! Configuration Types
//!
//! 定义所有配置结构体

use serde::Deserialize;
use std::time::Duration;

use crate::domain::voice::{VoiceName, VoiceParameters, DEFAULT_VOICE};

/// 应用主配置
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Discord 连接配置
    #[serde(default)]
    pub discord: DiscordConfig,

    /// 语音合成服务配置
    #[serde(default)]
    pub speech: SpeechConfig,

    /// 语音会话配置
    #[serde(default)]
    pub voice: VoiceConfig,

    /// 数据库配置
    #[serde(default)]
    pub database: DatabaseConfig,

    /// 日志配置
    #[serde(default)]
    pub log: LogConfig,
}

/// Discord 配置
#[derive(Clone, Default, Deserialize)]
pub struct DiscordConfig {
    /// Bot token
    #[serde(default)]
    pub token: String,

    /// 设置后只在该服务器注册斜杠命令（开发用，立即生效）
    #[serde(default)]
    pub command_guild_id: Option<u64>,
}

impl std::fmt::Debug for DiscordConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiscordConfig")
            .field("token", &redact(&self.token))
            .field("command_guild_id", &self.command_guild_id)
            .finish()
    }
}

/// 语音合成服务配置
#[derive(Clone, Deserialize)]
pub struct SpeechConfig {
    /// 服务地址，例如 https://japaneast.api.cognitive.microsoft.com
    #[serde(default)]
    pub endpoint: String,

    /// 订阅密钥
    #[serde(default)]
    pub key: String,

    /// 输出格式
    #[serde(default = "default_output_format")]
    pub output_format: String,

    /// 请求超时时间（秒）
    #[serde(default = "default_speech_timeout")]
    pub timeout_secs: u64,
}

fn default_output_format() -> String {
    "ogg-48khz-16bit-mono-opus".to_string()
}

fn default_speech_timeout() -> u64 {
    10
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            key: String::new(),
            output_format: default_output_format(),
            timeout_secs: default_speech_timeout(),
        }
    }
}

impl std::fmt::Debug for SpeechConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpeechConfig")
            .field("endpoint", &self.endpoint)
            .field("key", &redact(&self.key))
            .field("output_format", &self.output_format)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// 语音会话配置
#[derive(Debug, Clone, Deserialize)]
pub struct VoiceConfig {
    /// 等待语音连接就绪的上限（秒）
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    /// 等待播放结束的上限（秒）
    #[serde(default = "default_playback_timeout")]
    pub playback_timeout_secs: u64,

    /// 排队数达到此值时丢弃入退室播报
    #[serde(default = "default_max_queued_announcements")]
    pub max_queued_announcements: usize,

    /// 未设置偏好的用户和入退室播报使用的音色
    #[serde(default = "default_voice")]
    pub default_voice: String,

    #[serde(default = "default_ratio")]
    pub default_pitch: f32,

    #[serde(default = "default_ratio")]
    pub default_speed: f32,
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_playback_timeout() -> u64 {
    5
}

fn default_max_queued_announcements() -> usize {
    8
}

fn default_voice() -> String {
    DEFAULT_VOICE.to_string()
}

fn default_ratio() -> f32 {
    1.0
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: default_connect_timeout(),
            playback_timeout_secs: default_playback_timeout(),
            max_queued_announcements: default_max_queued_announcements(),
            default_voice: default_voice(),
            default_pitch: default_ratio(),
            default_speed: default_ratio(),
        }
    }
}

impl VoiceConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn playback_timeout(&self) -> Duration {
        Duration::from_secs(self.playback_timeout_secs)
    }

    /// 默认合成参数
    pub fn default_params(&self) -> Result<VoiceParameters, crate::domain::voice::VoiceError> {
        VoiceParameters::new(
            VoiceName::parse(&self.default_voice)?,
            self.default_pitch,
            self.default_speed,
        )
    }
}

/// 数据库配置
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// 数据库文件路径
    #[serde(default = "default_db_path")]
    pub path: String,

    /// 最大连接数
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_db_path() -> String {
    "data/ohno.db".to_string()
}

fn default_max_connections() -> u32 {
    5
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
            max_connections: default_max_connections(),
        }
    }
}

impl DatabaseConfig {
    /// 获取数据库 URL
    pub fn database_url(&self) -> String {
        format!("sqlite:{}?mode=rwc", self.path)
    }
}

/// 日志配置
#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// 日志级别
    #[serde(default = "default_log_level")]
    pub level: String,

    /// 是否启用 JSON 格式
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

/// 只保留末尾 4 个字符
pub(crate) fn redact(secret: &str) -> String {
    if secret.is_empty() {
        return "<unset>".to_string();
    }
    let tail: String = secret
        .chars()
        .rev()
        .take(4)
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();
    format!("****{}", tail)
}
