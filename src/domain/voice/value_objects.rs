//! Voice Context - Value Objects

use serde::{Deserialize, Serialize};

use super::VoiceError;

/// 可选的 Azure 日语神经网络音色
pub const KNOWN_VOICES: &[&str] = &[
    "Nanami", "Keita", "Aoi", "Daichi", "Mayu", "Naoki", "Shiori",
];

/// 默认音色
pub const DEFAULT_VOICE: &str = "ja-JP-NanamiNeural";

/// 音色名称（完整形式，例如 `ja-JP-NanamiNeural`）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoiceName(String);

impl VoiceName {
    /// 接受短名（`Nanami`）或完整名（`ja-JP-NanamiNeural`），只允许已知音色
    pub fn parse(name: &str) -> Result<Self, VoiceError> {
        let name = name.trim();
        KNOWN_VOICES
            .iter()
            .map(|short| (*short, Self::full_name(short)))
            .find(|(short, full)| short.eq_ignore_ascii_case(name) || full == name)
            .map(|(_, full)| Self(full))
            .ok_or_else(|| VoiceError::UnknownVoice(name.to_string()))
    }

    /// 不做校验，原样保存（从存储读取时使用）
    pub fn from_stored(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn full_name(short: &str) -> String {
        format!("ja-JP-{}Neural", short)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for VoiceName {
    fn default() -> Self {
        Self(DEFAULT_VOICE.to_string())
    }
}

impl std::fmt::Display for VoiceName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 每个用户的合成参数
///
/// 合成时只作为不透明参数透传给 TTS 服务
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoiceParameters {
    pub voice: VoiceName,
    /// 音调倍率
    pub pitch: f32,
    /// 语速倍率
    pub speed: f32,
}

impl Default for VoiceParameters {
    fn default() -> Self {
        Self {
            voice: VoiceName::default(),
            pitch: 1.0,
            speed: 1.0,
        }
    }
}

impl VoiceParameters {
    pub fn new(voice: VoiceName, pitch: f32, speed: f32) -> Result<Self, VoiceError> {
        let params = Self { voice, pitch, speed };
        params.validate()?;
        Ok(params)
    }

    pub fn validate(&self) -> Result<(), VoiceError> {
        if !(0.5..=2.0).contains(&self.speed) {
            return Err(VoiceError::InvalidSpeed(self.speed));
        }
        if !(0.5..=2.0).contains(&self.pitch) {
            return Err(VoiceError::InvalidPitch(self.pitch));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_short_and_full_names() {
        assert_eq!(VoiceName::parse("Keita").unwrap().as_str(), "ja-JP-KeitaNeural");
        assert_eq!(VoiceName::parse("shiori").unwrap().as_str(), "ja-JP-ShioriNeural");
        assert_eq!(
            VoiceName::parse("ja-JP-AoiNeural").unwrap().as_str(),
            "ja-JP-AoiNeural"
        );
        assert!(VoiceName::parse("en-US-JennyNeural").is_err());
    }

    #[test]
    fn test_default_parameters() {
        let params = VoiceParameters::default();
        assert_eq!(params.voice.as_str(), "ja-JP-NanamiNeural");
        assert_eq!(params.pitch, 1.0);
        assert_eq!(params.speed, 1.0);
    }

    #[test]
    fn test_parameter_ranges() {
        assert!(VoiceParameters::new(VoiceName::default(), 1.0, 2.5).is_err());
        assert!(VoiceParameters::new(VoiceName::default(), 0.1, 1.0).is_err());
        assert!(VoiceParameters::new(VoiceName::default(), 0.5, 2.0).is_ok());
    }
}
