//! Voice Session - 每个服务器一个的语音会话
//!
//! 持有唯一的语音连接和播放器，用 SpeakGate 把并发的朗读请求串行化

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use super::errors::{ConnectError, SpeakError};
use super::gate::SpeakGate;
use crate::application::ports::{
    AudioPlayerPort, DirectoryPort, PlayerStatus, SessionRegistryPort, SynthesisRequest,
    SynthesizerPort, VoiceConnectionPort, VoiceGatewayPort,
};
use crate::domain::announcement::{build_announcement, VoiceTransition};
use crate::domain::voice::VoiceParameters;
use crate::domain::{ChannelId, GuildId, UserId};

/// 会话设置
#[derive(Debug, Clone)]
pub struct SessionSettings {
    /// 等待连接就绪的上限
    pub connect_timeout: Duration,
    /// 等待播放器回到 Idle 的上限，超时强制停止
    pub playback_timeout: Duration,
    /// 排队数达到此值时丢弃新的入退室播报
    pub max_queued_announcements: usize,
    /// 入退室播报使用的音色
    pub announcement_voice: VoiceParameters,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(10),
            playback_timeout: Duration::from_secs(5),
            max_queued_announcements: 8,
            announcement_voice: VoiceParameters::default(),
        }
    }
}

/// 会话依赖的外部端口
#[derive(Clone)]
pub struct SessionPorts {
    pub gateway: Arc<dyn VoiceGatewayPort>,
    pub synthesizer: Arc<dyn SynthesizerPort>,
    pub registry: Arc<dyn SessionRegistryPort>,
}

/// 已就绪的连接与它的播放器
struct Connected {
    connection: Box<dyn VoiceConnectionPort>,
    player: Arc<dyn AudioPlayerPort>,
}

pub struct VoiceSession {
    id: Uuid,
    guild_id: GuildId,
    voice_channel_id: ChannelId,
    text_channel_id: ChannelId,
    /// Bot 自己的账号，来自网关握手
    self_user_id: UserId,
    settings: SessionSettings,
    ports: SessionPorts,
    connection: Mutex<Option<Connected>>,
    gate: SpeakGate,
}

impl VoiceSession {
    pub fn new(
        guild_id: GuildId,
        voice_channel_id: ChannelId,
        text_channel_id: ChannelId,
        self_user_id: UserId,
        settings: SessionSettings,
        ports: SessionPorts,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            guild_id,
            voice_channel_id,
            text_channel_id,
            self_user_id,
            settings,
            ports,
            connection: Mutex::new(None),
            gate: SpeakGate::new(),
        }
    }

    /// 建立语音连接，就绪后登记到注册表
    ///
    /// 超时或传输错误时返回错误，会话不会被登记。
    /// "是否已连接" 的预检查由调用方负责
    pub async fn connect(self: &Arc<Self>) -> Result<(), ConnectError> {
        tracing::info!(
            guild_id = %self.guild_id,
            channel_id = %self.voice_channel_id,
            "Connecting voice session"
        );

        let join = self
            .ports
            .gateway
            .join(self.guild_id, self.voice_channel_id);
        let connection = match tokio::time::timeout(self.settings.connect_timeout, join).await {
            Ok(Ok(connection)) => connection,
            Ok(Err(e)) => {
                tracing::warn!(guild_id = %self.guild_id, error = %e, "Voice join failed");
                self.ports.gateway.abandon(self.guild_id).await;
                return Err(ConnectError::Transport(e));
            }
            Err(_) => {
                tracing::warn!(
                    guild_id = %self.guild_id,
                    timeout = ?self.settings.connect_timeout,
                    "Voice connection not ready in time"
                );
                self.ports.gateway.abandon(self.guild_id).await;
                return Err(ConnectError::Timeout(self.settings.connect_timeout));
            }
        };

        let player = connection.player();
        *self.connection.lock().await = Some(Connected { connection, player });

        if let Err(e) = self.ports.registry.register(self.clone()) {
            tracing::warn!(guild_id = %self.guild_id, error = %e, "Session registration refused");
            if let Some(connected) = self.connection.lock().await.take() {
                let _ = connected.connection.disconnect().await;
            }
            return Err(ConnectError::AlreadyConnected(self.guild_id));
        }

        tracing::info!(session_id = %self.id, guild_id = %self.guild_id, "Voice session ready");
        Ok(())
    }

    /// 合成并播放一段文本
    ///
    /// 排在之前的朗读之后执行；播放结束（或超时被强制停止）后才释放 gate
    pub async fn speak(&self, text: &str, params: &VoiceParameters) -> Result<(), SpeakError> {
        let permit = self.gate.acquire().await?;
        let cancel = permit.cancellation().clone();

        let player = self.player().await.ok_or(SpeakError::NotConnected)?;

        tracing::debug!(
            guild_id = %self.guild_id,
            text_len = text.len(),
            voice = %params.voice,
            "Speak job started"
        );

        let request = SynthesisRequest::new(text, params.clone());
        let audio = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(SpeakError::Cancelled),
            result = self.ports.synthesizer.synthesize(request) => result?,
        };

        player.play(audio).await?;
        self.wait_idle(player.as_ref(), &cancel).await?;

        tracing::debug!(guild_id = %self.guild_id, "Speak job finished");
        Ok(())
    }

    async fn wait_idle(
        &self,
        player: &dyn AudioPlayerPort,
        cancel: &CancellationToken,
    ) -> Result<(), SpeakError> {
        let timeout = self.settings.playback_timeout;
        let finished = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                // 与 stop() 竞争时，本任务的音轨可能在对方停止之后才开始
                player.stop().await;
                return Err(SpeakError::Cancelled);
            }
            finished = wait_for_idle(player, timeout) => finished,
        };

        if !finished {
            tracing::warn!(guild_id = %self.guild_id, ?timeout, "Playback stuck, forcing stop");
            player.stop().await;
            return Err(SpeakError::PlaybackTimeout(timeout));
        }
        Ok(())
    }

    /// 取消排队中的和正在进行的朗读，停止播放并等待播放器空闲
    pub async fn stop(&self) -> Result<(), SpeakError> {
        self.gate.cancel();

        let Some(player) = self.player().await else {
            return Ok(());
        };
        player.stop().await;

        let timeout = self.settings.playback_timeout;
        if !wait_for_idle(player.as_ref(), timeout).await {
            return Err(SpeakError::PlaybackTimeout(timeout));
        }

        tracing::info!(guild_id = %self.guild_id, "Voice session stopped");
        Ok(())
    }

    /// 断开连接、取消 gate、从注册表移除
    ///
    /// 可重复调用
    pub async fn destroy(&self) {
        self.gate.cancel();

        let connected = self.connection.lock().await.take();
        if let Some(connected) = connected {
            connected.player.stop().await;
            if let Err(e) = connected.connection.disconnect().await {
                tracing::warn!(guild_id = %self.guild_id, error = %e, "Voice disconnect failed");
            }
        }

        if self.ports.registry.remove(self.guild_id, self.id) {
            tracing::info!(session_id = %self.id, guild_id = %self.guild_id, "Voice session destroyed");
        }
    }

    /// 语音状态变化对应的播报文本；不需要播报时为 None
    pub fn announcement_for(
        &self,
        transition: &VoiceTransition,
        directory: &dyn DirectoryPort,
    ) -> Option<String> {
        if transition.guild_id != self.guild_id {
            return None;
        }
        let member = directory.member(self.guild_id, transition.user_id);
        build_announcement(
            transition,
            self.voice_channel_id,
            self.self_user_id,
            member.as_ref(),
            |channel_id| directory.channel_name(self.guild_id, channel_id),
        )
    }

    /// 处理语音状态变化：需要时朗读播报
    ///
    /// 失败只记录日志，不向事件分发方传播
    pub async fn handle_voice_state_transition(
        &self,
        transition: &VoiceTransition,
        directory: &dyn DirectoryPort,
    ) {
        let Some(text) = self.announcement_for(transition, directory) else {
            return;
        };

        let queued = self.gate.waiting();
        if queued >= self.settings.max_queued_announcements {
            tracing::warn!(
                guild_id = %self.guild_id,
                queued,
                "Too many pending speak jobs, dropping announcement"
            );
            return;
        }

        if let Err(e) = self.speak(&text, &self.settings.announcement_voice).await {
            tracing::warn!(
                guild_id = %self.guild_id,
                user_id = %transition.user_id,
                error = %e,
                "Announcement failed"
            );
        }
    }

    async fn player(&self) -> Option<Arc<dyn AudioPlayerPort>> {
        self.connection
            .lock()
            .await
            .as_ref()
            .map(|connected| connected.player.clone())
    }

    pub async fn is_connected(&self) -> bool {
        self.connection.lock().await.is_some()
    }

    // Getters
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn guild_id(&self) -> GuildId {
        self.guild_id
    }

    pub fn voice_channel_id(&self) -> ChannelId {
        self.voice_channel_id
    }

    pub fn text_channel_id(&self) -> ChannelId {
        self.text_channel_id
    }

    pub fn pending_jobs(&self) -> usize {
        self.gate.waiting()
    }
}

/// 等待播放器回到 Idle；超时返回 false，播放器消失视为空闲
async fn wait_for_idle(player: &dyn AudioPlayerPort, timeout: Duration) -> bool {
    let mut status = player.status();
    let finished = tokio::time::timeout(timeout, status.wait_for(|s| *s == PlayerStatus::Idle))
        .await
        .is_ok();
    finished
}

impl std::fmt::Debug for VoiceSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VoiceSession")
            .field("id", &self.id)
            .field("guild_id", &self.guild_id)
            .field("voice_channel_id", &self.voice_channel_id)
            .field("text_channel_id", &self.text_channel_id)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::{DirectoryPort, PlaybackError, SynthesisError};
    use crate::domain::announcement::{MemberProfile, VoicePresence};
    use crate::infrastructure::adapters::tts::FakeSynthesizerConfig;
    use crate::infrastructure::memory::InMemoryDirectory;
    use crate::test_support::{
        session_fixture, session_fixture_with, FakeGatewayConfig, FakePlayerConfig,
        FixtureOptions, VOICE_CHANNEL,
    };

    const GUILD: GuildId = GuildId::new(1);

    fn hanging_player() -> FixtureOptions {
        FixtureOptions {
            gateway: FakeGatewayConfig {
                player: FakePlayerConfig {
                    playback: None,
                    ..Default::default()
                },
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn playback_events(events: Vec<String>) -> Vec<String> {
        events
            .into_iter()
            .filter(|e| e.starts_with("synth:") || e.starts_with("start:") || e.starts_with("end:"))
            .collect()
    }

    #[tokio::test]
    async fn test_concurrent_speaks_never_overlap() {
        let fixture = session_fixture();
        let session = fixture.connected(GUILD).await;

        let mut handles = Vec::new();
        for text in ["a", "b", "c"] {
            let session = session.clone();
            handles.push(tokio::spawn(async move {
                session.speak(text, &VoiceParameters::default()).await
            }));
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(
            playback_events(fixture.events()),
            vec![
                "synth:a", "start:a", "end:a", "synth:b", "start:b", "end:b", "synth:c",
                "start:c", "end:c",
            ]
        );
    }

    #[tokio::test]
    async fn test_stop_cancels_current_and_queued_jobs() {
        let fixture = session_fixture_with(hanging_player());
        let session = fixture.connected(GUILD).await;

        let mut handles = Vec::new();
        for text in ["a", "b", "c"] {
            let session = session.clone();
            handles.push(tokio::spawn(async move {
                session.speak(text, &VoiceParameters::default()).await
            }));
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert_eq!(session.pending_jobs(), 2);

        session.stop().await.unwrap();
        for handle in handles {
            let result = tokio::time::timeout(Duration::from_millis(100), handle)
                .await
                .expect("job should be cancelled promptly")
                .unwrap();
            assert!(matches!(result, Err(SpeakError::Cancelled)));
        }

        // 取消的任务从未进入合成
        assert_eq!(fixture.log.count("synth:"), 1);
        assert!(fixture.events().contains(&"stop".to_string()));

        // stop 之后的新任务不受影响
        let next = session.speak("d", &VoiceParameters::default()).await;
        assert!(matches!(next, Err(SpeakError::PlaybackTimeout(_))));
        assert_eq!(fixture.log.count("synth:d"), 1);
    }

    #[tokio::test]
    async fn test_cancelled_job_stops_its_own_track() {
        let fixture = session_fixture_with(hanging_player());
        let session = fixture.connected(GUILD).await;

        let job = {
            let session = session.clone();
            tokio::spawn(async move { session.speak("a", &VoiceParameters::default()).await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(fixture.log.count("start:a"), 1);

        // 只取消 gate，不经过 stop() 的播放器停止
        session.gate.cancel();
        let result = tokio::time::timeout(Duration::from_millis(100), job)
            .await
            .expect("job should be cancelled promptly")
            .unwrap();
        assert!(matches!(result, Err(SpeakError::Cancelled)));

        let events = fixture.events();
        let started = events.iter().position(|e| e == "start:a").unwrap();
        let stopped = events.iter().rposition(|e| e == "stop").unwrap();
        assert!(stopped > started);
    }

    #[tokio::test]
    async fn test_playback_timeout_forces_stop_and_releases_gate() {
        let fixture = session_fixture_with(hanging_player());
        let session = fixture.connected(GUILD).await;

        let started = tokio::time::Instant::now();
        let result = session.speak("a", &VoiceParameters::default()).await;
        assert!(matches!(result, Err(SpeakError::PlaybackTimeout(_))));
        assert!(started.elapsed() >= fixture.settings.playback_timeout);
        assert!(fixture.events().contains(&"stop".to_string()));

        let next = session.speak("b", &VoiceParameters::default()).await;
        assert!(matches!(next, Err(SpeakError::PlaybackTimeout(_))));
        assert_eq!(fixture.log.count("synth:"), 2);
    }

    #[tokio::test]
    async fn test_synthesis_failure_releases_gate() {
        let fixture = session_fixture_with(FixtureOptions {
            synthesizer: FakeSynthesizerConfig {
                reject_with: Some(500),
                ..Default::default()
            },
            ..Default::default()
        });
        let session = fixture.connected(GUILD).await;

        for text in ["a", "b"] {
            let result = tokio::time::timeout(
                Duration::from_millis(200),
                session.speak(text, &VoiceParameters::default()),
            )
            .await
            .expect("failed job must not hold the gate");
            assert!(matches!(
                result,
                Err(SpeakError::Synthesis(SynthesisError::Rejected { status: 500, .. }))
            ));
        }
        assert_eq!(fixture.log.count("start:"), 0);
    }

    #[tokio::test]
    async fn test_playback_rejection_releases_gate() {
        let fixture = session_fixture_with(FixtureOptions {
            gateway: FakeGatewayConfig {
                player: FakePlayerConfig {
                    reject: true,
                    ..Default::default()
                },
                ..Default::default()
            },
            ..Default::default()
        });
        let session = fixture.connected(GUILD).await;

        for text in ["a", "b"] {
            let result = tokio::time::timeout(
                Duration::from_millis(200),
                session.speak(text, &VoiceParameters::default()),
            )
            .await
            .expect("rejected job must not hold the gate");
            assert!(matches!(
                result,
                Err(SpeakError::Playback(PlaybackError::Rejected(_)))
            ));
        }
        assert_eq!(fixture.log.count("reject:"), 2);
        assert_eq!(session.pending_jobs(), 0);
    }

    #[tokio::test]
    async fn test_speak_without_connection() {
        let fixture = session_fixture();
        let session = fixture.session(GUILD);
        let result = session.speak("a", &VoiceParameters::default()).await;
        assert!(matches!(result, Err(SpeakError::NotConnected)));
    }

    #[tokio::test]
    async fn test_connect_timeout_leaves_nothing_registered() {
        let fixture = session_fixture_with(FixtureOptions {
            gateway: FakeGatewayConfig {
                hang: true,
                ..Default::default()
            },
            ..Default::default()
        });
        let session = fixture.session(GUILD);

        let result = session.connect().await;
        assert!(matches!(result, Err(ConnectError::Timeout(_))));
        assert!(!fixture.is_registered(GUILD));
        assert!(!session.is_connected().await);
        assert_eq!(fixture.log.count("abandon:1"), 1);
    }

    #[tokio::test]
    async fn test_connect_failure_is_reported() {
        let fixture = session_fixture_with(FixtureOptions {
            gateway: FakeGatewayConfig {
                fail_join: true,
                ..Default::default()
            },
            ..Default::default()
        });
        let session = fixture.session(GUILD);

        let result = session.connect().await;
        assert!(matches!(result, Err(ConnectError::Transport(_))));
        assert!(!fixture.is_registered(GUILD));
        assert_eq!(fixture.log.count("abandon:"), 1);
    }

    #[tokio::test]
    async fn test_second_session_for_guild_is_refused() {
        let fixture = session_fixture();
        let first = fixture.connected(GUILD).await;
        let second = fixture.session(GUILD);

        let result = second.connect().await;
        assert!(matches!(result, Err(ConnectError::AlreadyConnected(g)) if g == GUILD));
        assert!(!second.is_connected().await);
        assert_eq!(fixture.log.count("disconnect:"), 1);

        let registered = fixture.registry.get(GUILD).unwrap();
        assert_eq!(registered.id(), first.id());
    }

    #[tokio::test]
    async fn test_destroy_is_idempotent() {
        let fixture = session_fixture();
        let session = fixture.connected(GUILD).await;
        assert!(fixture.is_registered(GUILD));

        session.destroy().await;
        session.destroy().await;

        assert!(!fixture.is_registered(GUILD));
        assert_eq!(fixture.log.count("disconnect:"), 1);
        let result = session.speak("a", &VoiceParameters::default()).await;
        assert!(matches!(result, Err(SpeakError::NotConnected)));
    }

    #[tokio::test]
    async fn test_destroy_cancels_inflight_job() {
        let fixture = session_fixture_with(hanging_player());
        let session = fixture.connected(GUILD).await;

        let job = {
            let session = session.clone();
            tokio::spawn(async move { session.speak("a", &VoiceParameters::default()).await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        session.destroy().await;

        let result = tokio::time::timeout(Duration::from_millis(100), job)
            .await
            .expect("job should end with the session")
            .unwrap();
        assert!(matches!(result, Err(SpeakError::Cancelled)));
    }

    fn directory_with_member() -> InMemoryDirectory {
        let directory = InMemoryDirectory::new();
        directory.upsert_member(
            GUILD,
            UserId::new(42),
            MemberProfile {
                nick: Some("たろう".into()),
                ..Default::default()
            },
        );
        directory
    }

    fn join_transition(guild_id: GuildId) -> VoiceTransition {
        VoiceTransition {
            guild_id,
            user_id: UserId::new(42),
            previous: VoicePresence::disconnected(),
            current: VoicePresence::in_channel(VOICE_CHANNEL),
        }
    }

    #[tokio::test]
    async fn test_join_announcement_is_spoken() {
        let fixture = session_fixture();
        let session = fixture.connected(GUILD).await;
        let directory = directory_with_member();

        session
            .handle_voice_state_transition(&join_transition(GUILD), &directory)
            .await;

        assert_eq!(
            playback_events(fixture.events()),
            vec![
                "synth:たろう が入室しました",
                "start:たろう が入室しました",
                "end:たろう が入室しました",
            ]
        );
    }

    #[tokio::test]
    async fn test_transition_from_other_guild_is_ignored() {
        let fixture = session_fixture();
        let session = fixture.connected(GUILD).await;
        let directory = directory_with_member();

        assert!(session
            .announcement_for(&join_transition(GuildId::new(2)), &directory)
            .is_none());
        assert_eq!(
            session
                .announcement_for(&join_transition(GUILD), &directory)
                .as_deref(),
            Some("たろう が入室しました")
        );
    }

    #[tokio::test]
    async fn test_announcements_dropped_when_queue_is_full() {
        let mut fixture = session_fixture_with(hanging_player());
        fixture.settings.max_queued_announcements = 1;
        let session = fixture.connected(GUILD).await;
        let directory = directory_with_member();

        let mut jobs = Vec::new();
        for text in ["a", "b"] {
            let session = session.clone();
            jobs.push(tokio::spawn(async move {
                session.speak(text, &VoiceParameters::default()).await
            }));
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert_eq!(session.pending_jobs(), 1);

        tokio::time::timeout(
            Duration::from_millis(50),
            session.handle_voice_state_transition(&join_transition(GUILD), &directory),
        )
        .await
        .expect("dropped announcement returns immediately");

        session.stop().await.unwrap();
        for job in jobs {
            let _ = job.await.unwrap();
        }
        assert_eq!(fixture.log.count("synth:たろう"), 0);
    }
}
