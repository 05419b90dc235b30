//! Configuration Loader
//!
//! 实现多源配置加载与合并逻辑
//!
//! 优先级（从高到低）：
//! 1. 环境变量
//! 2. 配置文件（config.toml）
//! 3. 默认值

use config::{Config, ConfigError as ConfigCrateError, Environment, File};
use std::path::Path;
use thiserror::Error;

use super::types::{redact, AppConfig};

/// 配置加载错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

impl From<ConfigCrateError> for ConfigError {
    fn from(err: ConfigCrateError) -> Self {
        ConfigError::LoadError(err.to_string())
    }
}

/// 配置文件搜索路径
const CONFIG_FILE_NAMES: &[&str] = &["config", "config.local"];

/// 环境变量前缀
const ENV_PREFIX: &str = "OHNO";

/// 加载应用配置
///
/// 按优先级从高到低合并配置：
/// 1. 环境变量（前缀 `OHNO_`，层级分隔符 `__`）
/// 2. 配置文件（config.toml 或 config.local.toml）
/// 3. 默认值
///
/// # 环境变量示例
/// - `OHNO_DISCORD__TOKEN=...`
/// - `OHNO_SPEECH__ENDPOINT=https://japaneast.api.cognitive.microsoft.com`
/// - `OHNO_SPEECH__KEY=...`
/// - `OHNO_DATABASE__PATH=/data/ohno.db`
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from_path(None)
}

/// 从指定路径加载配置
///
/// # 参数
/// - `config_path` - 可选的配置文件路径，如果为 None 则使用默认搜索路径
pub fn load_config_from_path(config_path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let mut builder = Config::builder();

    // 1. 默认值（最低优先级）
    builder = builder
        .set_default("speech.output_format", "ogg-48khz-16bit-mono-opus")?
        .set_default("speech.timeout_secs", 10)?
        .set_default("voice.connect_timeout_secs", 10)?
        .set_default("voice.playback_timeout_secs", 5)?
        .set_default("voice.max_queued_announcements", 8)?
        .set_default("voice.default_voice", "ja-JP-NanamiNeural")?
        .set_default("voice.default_pitch", 1.0)?
        .set_default("voice.default_speed", 1.0)?
        .set_default("database.path", "data/ohno.db")?
        .set_default("database.max_connections", 5)?
        .set_default("log.level", "info")?
        .set_default("log.json", false)?;

    // 2. 配置文件（如果存在）
    if let Some(path) = config_path {
        builder = builder.add_source(File::from(path).required(true));
    } else {
        for name in CONFIG_FILE_NAMES {
            builder = builder.add_source(File::with_name(name).required(false));
        }
    }

    // 3. 环境变量（最高优先级）
    // 例如: OHNO_SPEECH__KEY=xxxx
    // 注意: 环境变量名会被转换为小写
    builder = builder.add_source(
        Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;

    let app_config: AppConfig = config.try_deserialize().map_err(|e| {
        ConfigError::ParseError(format!("Failed to deserialize config: {}", e))
    })?;

    validate_config(&app_config)?;

    Ok(app_config)
}

/// 验证配置有效性
pub fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    if config.discord.token.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "Discord token cannot be empty".to_string(),
        ));
    }

    if config.speech.key.trim().is_empty() {
        return Err(ConfigError::ValidationError(
            "Speech subscription key cannot be empty".to_string(),
        ));
    }

    let endpoint = config.speech.endpoint.trim();
    if endpoint.is_empty() {
        return Err(ConfigError::ValidationError(
            "Speech endpoint cannot be empty".to_string(),
        ));
    }
    if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
        return Err(ConfigError::ValidationError(format!(
            "Speech endpoint must be an http(s) URL: {}",
            endpoint
        )));
    }

    if config.speech.timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "Speech timeout cannot be 0".to_string(),
        ));
    }

    if config.voice.connect_timeout_secs == 0 || config.voice.playback_timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "Voice timeouts cannot be 0".to_string(),
        ));
    }

    config
        .voice
        .default_params()
        .map_err(|e| ConfigError::ValidationError(format!("Invalid default voice: {}", e)))?;

    if config.database.path.is_empty() {
        return Err(ConfigError::ValidationError(
            "Database path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// 打印配置信息（用于启动时日志），密钥只显示末尾
pub fn print_config(config: &AppConfig) {
    tracing::info!("=== Application Configuration ===");
    tracing::info!("Discord Token: {}", redact(&config.discord.token));
    if let Some(guild_id) = config.discord.command_guild_id {
        tracing::info!("Command Guild: {}", guild_id);
    }
    tracing::info!("Speech Endpoint: {}", config.speech.endpoint);
    tracing::info!("Speech Key: {}", redact(&config.speech.key));
    tracing::info!("Speech Output Format: {}", config.speech.output_format);
    tracing::info!("Speech Timeout: {}s", config.speech.timeout_secs);
    tracing::info!("Voice Connect Timeout: {}s", config.voice.connect_timeout_secs);
    tracing::info!("Voice Playback Timeout: {}s", config.voice.playback_timeout_secs);
    tracing::info!("Max Queued Announcements: {}", config.voice.max_queued_announcements);
    tracing::info!("Default Voice: {}", config.voice.default_voice);
    tracing::info!("Database: {}", config.database.path);
    tracing::info!("Database Max Connections: {}", config.database.max_connections);
    tracing::info!("Log Level: {}", config.log.level);
    tracing::info!("=================================");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn valid_config() -> AppConfig {
        let mut config = AppConfig::default();
        config.discord.token = "token".into();
        config.speech.key = "key".into();
        config.speech.endpoint = "https://japaneast.api.cognitive.microsoft.com".into();
        config
    }

    #[test]
    fn test_validation_passes_for_valid_config() {
        assert!(validate_config(&valid_config()).is_ok());
    }

    #[test]
    fn test_validation_error_for_missing_secrets() {
        let mut config = valid_config();
        config.discord.token = String::new();
        assert!(validate_config(&config).is_err());

        let mut config = valid_config();
        config.speech.key = "  ".into();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validation_error_for_bad_endpoint() {
        let mut config = valid_config();
        config.speech.endpoint = String::new();
        assert!(validate_config(&config).is_err());

        config.speech.endpoint = "japaneast.api.cognitive.microsoft.com".into();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validation_error_for_zero_timeouts() {
        let mut config = valid_config();
        config.voice.playback_timeout_secs = 0;
        assert!(validate_config(&config).is_err());

        let mut config = valid_config();
        config.speech.timeout_secs = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validation_error_for_unknown_default_voice() {
        let mut config = valid_config();
        config.voice.default_voice = "en-US-JennyNeural".into();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[discord]
token = "file-token"
command_guild_id = 1234

[speech]
endpoint = "https://example.invalid"
key = "file-key"

[voice]
playback_timeout_secs = 7
default_voice = "Aoi"
"#
        )
        .unwrap();

        let config = load_config_from_path(Some(file.path())).unwrap();
        assert_eq!(config.discord.token, "file-token");
        assert_eq!(config.discord.command_guild_id, Some(1234));
        assert_eq!(config.speech.key, "file-key");
        assert_eq!(config.speech.output_format, "ogg-48khz-16bit-mono-opus");
        assert_eq!(config.voice.playback_timeout_secs, 7);
        assert_eq!(config.voice.connect_timeout_secs, 10);
        assert_eq!(config.voice.default_params().unwrap().voice.as_str(), "ja-JP-AoiNeural");
    }

    #[test]
    fn test_load_fails_without_secrets() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[log]\nlevel = \"debug\"").unwrap();

        let result = load_config_from_path(Some(file.path()));
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }
}
