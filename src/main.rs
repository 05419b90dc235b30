//! OHNO - Discord 读み上げ Bot
//!
//! 组装各层：配置 → 日志 → 数据库 → 适配器 → 命令处理器 → Discord 客户端

use std::sync::Arc;

use serenity::all::GatewayIntents;
use serenity::Client;
use songbird::SerenityInit;

use ohno::application::{
    DeleteWordHandler, GetVoicePreferenceHandler, JoinVoiceHandler, LeaveVoiceHandler,
    ListWordsHandler, PutWordHandler, SessionPorts, SessionRegistryPort, SessionSettings,
    SetVoicePreferenceHandler, SkipSpeechHandler, SpeakMessageHandler, SuggestWordsHandler,
};
use ohno::config::{load_config, print_config, LogConfig};
use ohno::infrastructure::adapters::{AzureSpeechClient, AzureSpeechConfig, SongbirdGateway};
use ohno::infrastructure::discord::{BotServices, DiscordHandler};
use ohno::infrastructure::memory::{
    InMemoryDirectory, InMemorySessionRegistry, InMemoryWordCache, VoiceStateTracker,
};
use ohno::infrastructure::persistence::sqlite::{
    create_pool, run_migrations, DatabaseConfig, SqliteDictionaryRepository,
    SqlitePreferenceRepository,
};

fn init_tracing(log: &LogConfig) {
    let log_filter = format!("warn,ohno={},songbird=warn,serenity=warn", log.level);
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_filter));

    if log.json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 加载配置（优先级：环境变量 > 配置文件 > 默认值）
    let config = load_config().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;

    init_tracing(&config.log);

    tracing::info!("OHNO - Discord 読み上げ Bot");
    print_config(&config);

    // 确保数据目录存在
    if let Some(parent) = std::path::Path::new(&config.database.path).parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }

    // 初始化数据库
    let db_config = DatabaseConfig {
        database_url: config.database.database_url(),
        max_connections: config.database.max_connections,
    };
    let pool = create_pool(&db_config).await?;
    run_migrations(&pool).await?;

    // 创建 Repository 适配器
    let dictionary_repo = Arc::new(SqliteDictionaryRepository::new(pool.clone()));
    let preference_repo = Arc::new(SqlitePreferenceRepository::new(pool.clone()));

    // 创建语音合成客户端
    let speech_config = AzureSpeechConfig {
        output_format: config.speech.output_format.clone(),
        ..AzureSpeechConfig::new(&config.speech.endpoint, &config.speech.key)
            .with_timeout(config.speech.timeout_secs)
    };
    let synthesizer = Arc::new(AzureSpeechClient::new(speech_config)?);

    // 语音网关
    let songbird = songbird::Songbird::serenity();
    let gateway = Arc::new(SongbirdGateway::new(songbird.clone()));

    // 内存状态
    let registry = Arc::new(InMemorySessionRegistry::new());
    let directory = Arc::new(InMemoryDirectory::new());
    let tracker = Arc::new(VoiceStateTracker::new());
    let word_cache = Arc::new(InMemoryWordCache::new());

    let default_params = config.voice.default_params()?;
    let settings = SessionSettings {
        connect_timeout: config.voice.connect_timeout(),
        playback_timeout: config.voice.playback_timeout(),
        max_queued_announcements: config.voice.max_queued_announcements,
        announcement_voice: default_params.clone(),
    };
    let ports = SessionPorts {
        gateway,
        synthesizer,
        registry: registry.clone(),
    };

    let services = Arc::new(BotServices {
        registry: registry.clone(),
        directory: directory.clone(),
        tracker,
        join: JoinVoiceHandler::new(ports, settings),
        leave: LeaveVoiceHandler::new(registry.clone()),
        skip: SkipSpeechHandler::new(registry.clone()),
        speak: SpeakMessageHandler::new(
            registry.clone(),
            dictionary_repo.clone(),
            preference_repo.clone(),
            directory,
            default_params.clone(),
        ),
        put_word: PutWordHandler::new(dictionary_repo.clone(), word_cache.clone()),
        delete_word: DeleteWordHandler::new(dictionary_repo.clone(), word_cache.clone()),
        list_words: ListWordsHandler::new(dictionary_repo.clone()),
        suggest_words: SuggestWordsHandler::new(dictionary_repo, word_cache),
        set_preference: SetVoicePreferenceHandler::new(
            preference_repo.clone(),
            default_params.clone(),
        ),
        get_preference: GetVoicePreferenceHandler::new(preference_repo, default_params),
    });

    let intents = GatewayIntents::GUILDS
        | GatewayIntents::GUILD_MEMBERS
        | GatewayIntents::GUILD_VOICE_STATES
        | GatewayIntents::GUILD_MESSAGES
        | GatewayIntents::MESSAGE_CONTENT;

    let handler = DiscordHandler::new(services, config.discord.command_guild_id);
    let mut client = Client::builder(&config.discord.token, intents)
        .event_handler(handler)
        .register_songbird_with(songbird)
        .await?;

    // 收到退出信号：先断开所有语音会话，再关闭网关
    let shard_manager = client.shard_manager.clone();
    let shutdown_registry = registry.clone();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for ctrl-c");
            return;
        }
        tracing::info!("Received shutdown signal");

        for guild_id in shutdown_registry.active_guilds() {
            if let Some(session) = shutdown_registry.get(guild_id) {
                session.destroy().await;
            }
        }
        shard_manager.shutdown_all().await;
    });

    tracing::info!("Connecting to Discord gateway...");
    client.start().await?;

    tracing::info!("Shutdown complete");

    Ok(())
}
