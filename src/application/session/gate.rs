//! Speak Gate - 每个会话一把的可取消互斥锁
//!
//! 保证同一会话同时只有一个 "合成 + 播放" 任务。
//! 等待者按到达顺序排队（tokio Mutex 是 FIFO 公平的），
//! `cancel()` 会唤醒当前所有等待者并让它们得到 `GateCancelled`

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use thiserror::Error;
use tokio::sync::{Mutex as AsyncMutex, MutexGuard};
use tokio_util::sync::CancellationToken;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("Speak gate was cancelled")]
pub struct GateCancelled;

pub struct SpeakGate {
    lock: AsyncMutex<()>,
    /// 当前代的取消令牌；cancel 时替换为新令牌
    generation: Mutex<CancellationToken>,
    waiting: AtomicUsize,
}

/// 持有期间独占会话；drop 即释放
pub struct GatePermit<'a> {
    _guard: MutexGuard<'a, ()>,
    token: CancellationToken,
}

impl GatePermit<'_> {
    /// 获取许可时所属代的令牌，持有者用它感知 stop/destroy
    pub fn cancellation(&self) -> &CancellationToken {
        &self.token
    }
}

struct WaitingGuard<'a>(&'a AtomicUsize);

impl<'a> WaitingGuard<'a> {
    fn enter(counter: &'a AtomicUsize) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(counter)
    }
}

impl Drop for WaitingGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl SpeakGate {
    pub fn new() -> Self {
        Self {
            lock: AsyncMutex::new(()),
            generation: Mutex::new(CancellationToken::new()),
            waiting: AtomicUsize::new(0),
        }
    }

    fn current_token(&self) -> CancellationToken {
        self.generation
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// 等待获取许可，期间被取消则返回 `GateCancelled`
    pub async fn acquire(&self) -> Result<GatePermit<'_>, GateCancelled> {
        let token = self.current_token();
        let _waiting = WaitingGuard::enter(&self.waiting);

        tokio::select! {
            biased;
            _ = token.cancelled() => Err(GateCancelled),
            guard = self.lock.lock() => Ok(GatePermit { _guard: guard, token }),
        }
    }

    /// 取消当前所有等待者以及持有者的令牌，之后到达的调用不受影响
    pub fn cancel(&self) {
        let mut generation = self
            .generation
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        generation.cancel();
        *generation = CancellationToken::new();
    }

    /// 正在排队等待的调用数
    pub fn waiting(&self) -> usize {
        self.waiting.load(Ordering::SeqCst)
    }
}

impl Default for SpeakGate {
    fn default() -> Self {
        Self::new()
    }
}
