//! Voice Context - 音色限界上下文
//!
//! 职责:
//! - 已知音色列表
//! - 每个用户的合成参数（音色、音调、语速）

mod errors;
mod value_objects;

pub use errors::VoiceError;
pub use value_objects::{VoiceName, VoiceParameters, DEFAULT_VOICE, KNOWN_VOICES};
