//! Fake Synthesizer - 用于测试的合成器
//!
//! 不调用 TTS 服务，把文本本身作为 "音频" 字节流返回

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::stream::{self, StreamExt};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use crate::application::ports::{AudioStream, SynthesisError, SynthesisRequest, SynthesizerPort};

/// Fake Synthesizer 配置
#[derive(Debug, Clone, Default)]
pub struct FakeSynthesizerConfig {
    /// 模拟的合成延迟
    pub latency: Duration,
    /// 设置后所有请求都以该 HTTP 状态失败
    pub reject_with: Option<u16>,
}

/// Fake Synthesizer
///
/// 记录收到的文本，事件写入共享日志以便测试检查顺序
pub struct FakeSynthesizer {
    config: FakeSynthesizerConfig,
    log: Arc<Mutex<Vec<String>>>,
    requests: Mutex<Vec<SynthesisRequest>>,
}

impl FakeSynthesizer {
    pub fn new(config: FakeSynthesizerConfig) -> Self {
        Self {
            config,
            log: Arc::new(Mutex::new(Vec::new())),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// 与其他组件共用同一份事件日志
    pub fn with_log(config: FakeSynthesizerConfig, log: Arc<Mutex<Vec<String>>>) -> Self {
        Self {
            config,
            log,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn events(&self) -> Vec<String> {
        self.log
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// 收到的全部请求
    pub fn requests(&self) -> Vec<SynthesisRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn record(&self, event: String) {
        self.log
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }
}

impl Default for FakeSynthesizer {
    fn default() -> Self {
        Self::new(FakeSynthesizerConfig::default())
    }
}

#[async_trait]
impl SynthesizerPort for FakeSynthesizer {
    async fn synthesize(&self, request: SynthesisRequest) -> Result<AudioStream, SynthesisError> {
        tracing::debug!(
            text_len = request.text.len(),
            voice = %request.params.voice,
            "FakeSynthesizer: echoing text as audio"
        );
        self.record(format!("synth:{}", request.text));
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request.clone());

        if !self.config.latency.is_zero() {
            tokio::time::sleep(self.config.latency).await;
        }

        if let Some(status) = self.config.reject_with {
            return Err(SynthesisError::Rejected {
                status,
                body: "fake rejection".to_string(),
            });
        }

        let chunk = Bytes::from(request.text.into_bytes());
        Ok(stream::once(async move { Ok(chunk) }).boxed())
    }
}
