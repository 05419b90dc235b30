//! TTS Adapter - 语音合成客户端实现

mod azure_speech_client;
mod fake_synthesizer;

pub use azure_speech_client::{build_ssml, escape_ssml, AzureSpeechClient, AzureSpeechConfig};
pub use fake_synthesizer::{FakeSynthesizer, FakeSynthesizerConfig};
