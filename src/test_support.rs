//! 测试辅助：假的语音网关 / 连接 / 播放器，以及会话夹具
//!
//! 所有假组件写同一份事件日志，测试通过它检查执行顺序

use async_trait::async_trait;
use futures_util::StreamExt;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::application::ports::{
    AudioPlayerPort, AudioStream, PlaybackError, PlayerStatus, SessionRegistryPort,
    TransportError, VoiceConnectionPort, VoiceGatewayPort,
};
use crate::application::session::{SessionPorts, SessionSettings, VoiceSession};
use crate::domain::{ChannelId, GuildId, UserId};
use crate::infrastructure::adapters::tts::{FakeSynthesizer, FakeSynthesizerConfig};
use crate::infrastructure::memory::InMemorySessionRegistry;

pub const BOT_USER: UserId = UserId::new(999);
pub const VOICE_CHANNEL: ChannelId = ChannelId::new(100);
pub const TEXT_CHANNEL: ChannelId = ChannelId::new(200);

#[derive(Clone, Default)]
pub struct EventLog(Arc<Mutex<Vec<String>>>);

impl EventLog {
    pub fn push(&self, event: impl Into<String>) {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event.into());
    }

    pub fn events(&self) -> Vec<String> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.events().iter().filter(|e| e.starts_with(prefix)).count()
    }

    pub fn shared(&self) -> Arc<Mutex<Vec<String>>> {
        self.0.clone()
    }
}

#[derive(Debug, Clone)]
pub struct FakePlayerConfig {
    /// None 表示播放永远不结束
    pub playback: Option<Duration>,
    /// 模拟无法解码的音源
    pub reject: bool,
}

impl Default for FakePlayerConfig {
    fn default() -> Self {
        Self {
            playback: Some(Duration::from_millis(20)),
            reject: false,
        }
    }
}

pub struct FakePlayer {
    config: FakePlayerConfig,
    status: watch::Sender<PlayerStatus>,
    current: Mutex<Option<JoinHandle<()>>>,
    log: EventLog,
}

impl FakePlayer {
    pub fn new(config: FakePlayerConfig, log: EventLog) -> Self {
        let (status, _) = watch::channel(PlayerStatus::Idle);
        Self {
            config,
            status,
            current: Mutex::new(None),
            log,
        }
    }

    fn replace_current(&self, handle: Option<JoinHandle<()>>) {
        let previous = std::mem::replace(
            &mut *self.current.lock().unwrap_or_else(PoisonError::into_inner),
            handle,
        );
        if let Some(previous) = previous {
            previous.abort();
        }
    }
}

#[async_trait]
impl AudioPlayerPort for FakePlayer {
    async fn play(&self, mut source: AudioStream) -> Result<(), PlaybackError> {
        let mut text = Vec::new();
        while let Some(chunk) = source.next().await {
            let chunk = chunk.map_err(|e| PlaybackError::Rejected(e.to_string()))?;
            text.extend_from_slice(&chunk);
        }
        let text = String::from_utf8_lossy(&text).into_owned();

        if self.config.reject {
            self.log.push(format!("reject:{text}"));
            return Err(PlaybackError::Rejected("fake undecodable source".to_string()));
        }
        self.log.push(format!("start:{text}"));
        self.status.send_replace(PlayerStatus::Playing);

        let handle = self.config.playback.map(|duration| {
            let status = self.status.clone();
            let log = self.log.clone();
            tokio::spawn(async move {
                tokio::time::sleep(duration).await;
                log.push(format!("end:{text}"));
                status.send_replace(PlayerStatus::Idle);
            })
        });
        self.replace_current(handle);
        Ok(())
    }

    async fn stop(&self) {
        self.replace_current(None);
        self.log.push("stop");
        self.status.send_replace(PlayerStatus::Idle);
    }

    fn status(&self) -> watch::Receiver<PlayerStatus> {
        self.status.subscribe()
    }
}

pub struct FakeConnection {
    guild_id: GuildId,
    player: Arc<FakePlayer>,
    log: EventLog,
}

#[async_trait]
impl VoiceConnectionPort for FakeConnection {
    fn player(&self) -> Arc<dyn AudioPlayerPort> {
        self.player.clone()
    }

    async fn disconnect(&self) -> Result<(), TransportError> {
        self.log.push(format!("disconnect:{}", self.guild_id));
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct FakeGatewayConfig {
    pub join_delay: Duration,
    /// 连接永远不会就绪
    pub hang: bool,
    pub fail_join: bool,
    pub player: FakePlayerConfig,
}

pub struct FakeGateway {
    config: FakeGatewayConfig,
    log: EventLog,
}

impl FakeGateway {
    pub fn new(config: FakeGatewayConfig, log: EventLog) -> Self {
        Self { config, log }
    }
}

#[async_trait]
impl VoiceGatewayPort for FakeGateway {
    async fn join(
        &self,
        guild_id: GuildId,
        channel_id: ChannelId,
    ) -> Result<Box<dyn VoiceConnectionPort>, TransportError> {
        self.log.push(format!("join:{guild_id}:{channel_id}"));
        if self.config.hang {
            std::future::pending::<()>().await;
        }
        if !self.config.join_delay.is_zero() {
            tokio::time::sleep(self.config.join_delay).await;
        }
        if self.config.fail_join {
            return Err(TransportError::Join("fake failure".to_string()));
        }

        Ok(Box::new(FakeConnection {
            guild_id,
            player: Arc::new(FakePlayer::new(self.config.player.clone(), self.log.clone())),
            log: self.log.clone(),
        }))
    }

    async fn abandon(&self, guild_id: GuildId) {
        self.log.push(format!("abandon:{guild_id}"));
    }
}

#[derive(Debug, Clone, Default)]
pub struct FixtureOptions {
    pub synthesizer: FakeSynthesizerConfig,
    pub gateway: FakeGatewayConfig,
}

pub struct SessionFixture {
    pub registry: Arc<InMemorySessionRegistry>,
    pub synthesizer: Arc<FakeSynthesizer>,
    pub gateway: Arc<FakeGateway>,
    pub log: EventLog,
    pub settings: SessionSettings,
}

impl SessionFixture {
    pub fn ports(&self) -> SessionPorts {
        SessionPorts {
            gateway: self.gateway.clone(),
            synthesizer: self.synthesizer.clone(),
            registry: self.registry.clone(),
        }
    }

    /// 未连接的会话
    pub fn session(&self, guild_id: GuildId) -> Arc<VoiceSession> {
        Arc::new(VoiceSession::new(
            guild_id,
            VOICE_CHANNEL,
            TEXT_CHANNEL,
            BOT_USER,
            self.settings.clone(),
            self.ports(),
        ))
    }

    /// 已连接并登记的会话
    pub async fn connected(&self, guild_id: GuildId) -> Arc<VoiceSession> {
        let session = self.session(guild_id);
        session
            .connect()
            .await
            .expect("fake gateway should connect");
        session
    }

    pub fn events(&self) -> Vec<String> {
        self.log.events()
    }

    pub fn is_registered(&self, guild_id: GuildId) -> bool {
        self.registry.get(guild_id).is_some()
    }
}

pub fn session_fixture() -> SessionFixture {
    session_fixture_with(FixtureOptions::default())
}

pub fn session_fixture_with(options: FixtureOptions) -> SessionFixture {
    let log = EventLog::default();
    SessionFixture {
        registry: InMemorySessionRegistry::new().arc(),
        synthesizer: Arc::new(FakeSynthesizer::with_log(options.synthesizer, log.shared())),
        gateway: Arc::new(FakeGateway::new(options.gateway, log.clone())),
        log,
        settings: SessionSettings {
            connect_timeout: Duration::from_millis(200),
            playback_timeout: Duration::from_millis(300),
            max_queued_announcements: 8,
            ..SessionSettings::default()
        },
    }
}
