//! Voice Context - Errors

use thiserror::Error;

#[derive(Debug, Error)]
pub enum VoiceError {
    #[error("Unknown voice: {0}")]
    UnknownVoice(String),

    #[error("Speed must be between 0.5 and 2.0: {0}")]
    InvalidSpeed(f32),

    #[error("Pitch must be between 0.5 and 2.0: {0}")]
    InvalidPitch(f32),
}
