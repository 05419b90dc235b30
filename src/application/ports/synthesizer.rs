//! Synthesizer Port - 远程语音合成抽象
//!
//! 定义 TTS 合成的抽象接口，具体实现在 infrastructure/adapters 层

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::stream::BoxStream;
use thiserror::Error;

use crate::domain::voice::VoiceParameters;

/// 合成得到的音频字节流（Ogg/Opus），边下载边消费
pub type AudioStream = BoxStream<'static, std::io::Result<Bytes>>;

/// 合成错误
#[derive(Debug, Error)]
pub enum SynthesisError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timeout")]
    Timeout,

    /// 服务返回非 2xx
    #[error("Synthesis rejected (HTTP {status}): {body}")]
    Rejected { status: u16, body: String },

    /// 服务返回了空 body
    #[error("Synthesis returned an empty body")]
    EmptyBody,
}

/// 合成请求
///
/// `text` 应当已经完成清理和字典替换
#[derive(Debug, Clone)]
pub struct SynthesisRequest {
    pub text: String,
    pub params: VoiceParameters,
}

impl SynthesisRequest {
    pub fn new(text: impl Into<String>, params: VoiceParameters) -> Self {
        Self {
            text: text.into(),
            params,
        }
    }
}

/// Synthesizer Port
///
/// 单次网络调用：无重试、无缓存
#[async_trait]
pub trait SynthesizerPort: Send + Sync {
    /// 合成语音，返回实时字节流
    async fn synthesize(&self, request: SynthesisRequest) -> Result<AudioStream, SynthesisError>;
}
