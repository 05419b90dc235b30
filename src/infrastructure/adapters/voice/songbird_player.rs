//! Songbird Player - 把合成字节流送进 songbird Call
//!
//! 字节流由后台任务写入 duplex 管道，管道读端包装成 songbird 的
//! 实时输入（Ogg/Opus，不可 seek）。音轨结束事件把状态切回 Idle

use async_trait::async_trait;
use songbird::input::{
    AsyncAdapterStream, AsyncMediaSource, AudioStream as SongbirdAudioStream, AudioStreamError,
    Input, LiveInput,
};
use songbird::tracks::ControlError;
use songbird::{Call, Event, EventContext, EventHandler as SongbirdEventHandler, TrackEvent};
use std::io::{self, SeekFrom};
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};
use symphonia::core::io::MediaSource;
use symphonia::core::probe::Hint;
use tokio::io::{AsyncRead, AsyncSeek, DuplexStream, ReadBuf};
use tokio::sync::{watch, Mutex};
use tokio_util::io::StreamReader;

use crate::application::ports::{AudioPlayerPort, AudioStream, PlaybackError, PlayerStatus};
use crate::domain::GuildId;

/// 管道缓冲大小
const PIPE_CAPACITY: usize = 64 * 1024;
/// songbird 读端的缓冲大小
const ADAPTER_BUFFER: usize = 64 * 1024;

/// duplex 管道读端，作为只读、不可 seek 的媒体源
struct PipeSource {
    reader: DuplexStream,
}

impl AsyncRead for PipeSource {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        Pin::new(&mut self.reader).poll_read(cx, buf)
    }
}

impl AsyncSeek for PipeSource {
    fn start_seek(self: Pin<&mut Self>, _position: SeekFrom) -> io::Result<()> {
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "live synthesis stream cannot seek",
        ))
    }

    fn poll_complete(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<u64>> {
        Poll::Ready(Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "live synthesis stream cannot seek",
        )))
    }
}

#[async_trait]
impl AsyncMediaSource for PipeSource {
    fn is_seekable(&self) -> bool {
        false
    }

    async fn byte_len(&self) -> Option<u64> {
        None
    }

    async fn try_resume(
        &mut self,
        _offset: u64,
    ) -> Result<Box<dyn AsyncMediaSource>, AudioStreamError> {
        Err(AudioStreamError::Unsupported)
    }
}

/// 音轨结束或出错时切回 Idle
///
/// 只有仍是当前音轨时才生效，避免被停止的旧音轨覆盖新音轨的状态
struct IdleNotifier {
    generation: u64,
    current: Arc<AtomicU64>,
    status: watch::Sender<PlayerStatus>,
    guild_id: GuildId,
}

#[async_trait]
impl SongbirdEventHandler for IdleNotifier {
    async fn act(&self, ctx: &EventContext<'_>) -> Option<Event> {
        if let EventContext::Track(tracks) = ctx {
            for (state, _) in tracks.iter() {
                tracing::debug!(
                    guild_id = %self.guild_id,
                    playing = ?state.playing,
                    "Track finished"
                );
            }
        }

        if self.current.load(Ordering::SeqCst) == self.generation {
            self.status.send_replace(PlayerStatus::Idle);
        }
        Some(Event::Cancel)
    }
}

pub struct SongbirdPlayer {
    guild_id: GuildId,
    call: Arc<Mutex<Call>>,
    status: watch::Sender<PlayerStatus>,
    generation: Arc<AtomicU64>,
}

impl SongbirdPlayer {
    pub fn new(guild_id: GuildId, call: Arc<Mutex<Call>>) -> Self {
        let (status, _) = watch::channel(PlayerStatus::Idle);
        Self {
            guild_id,
            call,
            status,
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    /// 把字节流接到 duplex 管道上，返回 songbird 可以消费的输入
    fn live_input(&self, source: AudioStream) -> Input {
        let (reader, mut writer) = tokio::io::duplex(PIPE_CAPACITY);
        let guild_id = self.guild_id;
        tokio::spawn(async move {
            let mut body = StreamReader::new(source);
            if let Err(e) = tokio::io::copy(&mut body, &mut writer).await {
                tracing::warn!(guild_id = %guild_id, error = %e, "Synthesis stream interrupted");
            }
        });

        let adapter = AsyncAdapterStream::new(Box::new(PipeSource { reader }), ADAPTER_BUFFER);
        let mut hint = Hint::new();
        hint.with_extension("ogg");

        Input::Live(
            LiveInput::Raw(SongbirdAudioStream {
                input: Box::new(adapter) as Box<dyn MediaSource>,
                hint: Some(hint),
            }),
            None,
        )
    }
}

#[async_trait]
impl AudioPlayerPort for SongbirdPlayer {
    async fn play(&self, source: AudioStream) -> Result<(), PlaybackError> {
        let input = self.live_input(source);
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;

        let handle = {
            let mut call = self.call.lock().await;
            call.play_only_input(input)
        };
        self.status.send_replace(PlayerStatus::Playing);

        for event in [TrackEvent::End, TrackEvent::Error] {
            let notifier = IdleNotifier {
                generation,
                current: self.generation.clone(),
                status: self.status.clone(),
                guild_id: self.guild_id,
            };
            if let Err(e) = handle.add_event(Event::Track(event), notifier) {
                // 音轨已经结束，不会再有事件
                tracing::debug!(guild_id = %self.guild_id, error = %e, "Track ended before events were attached");
                if self.generation.load(Ordering::SeqCst) == generation {
                    self.status.send_replace(PlayerStatus::Idle);
                }
                return Ok(());
            }
        }

        // 等 songbird 解析出 Ogg 头；音源无法解码时在这里报错
        match handle.make_playable_async().await {
            Ok(()) => {
                tracing::debug!(guild_id = %self.guild_id, generation, "Track started");
                Ok(())
            }
            Err(ControlError::Finished) => {
                tracing::debug!(guild_id = %self.guild_id, generation, "Track finished while starting");
                Ok(())
            }
            Err(e) => {
                tracing::warn!(guild_id = %self.guild_id, error = %e, "Track could not be played");
                if self.generation.load(Ordering::SeqCst) == generation {
                    self.status.send_replace(PlayerStatus::Idle);
                }
                Err(PlaybackError::Rejected(e.to_string()))
            }
        }
    }

    async fn stop(&self) {
        // 让已排队的结束事件失效
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.call.lock().await.stop();
        self.status.send_replace(PlayerStatus::Idle);
        tracing::debug!(guild_id = %self.guild_id, "Player stopped");
    }

    fn status(&self) -> watch::Receiver<PlayerStatus> {
        self.status.subscribe()
    }
}
