//! Discord Snowflake 标识
//!
//! 领域层不依赖 serenity 的 ID 类型，适配器在边界处转换

use serde::{Deserialize, Serialize};

macro_rules! snowflake {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(u64);

        impl $name {
            pub const fn new(id: u64) -> Self {
                Self(id)
            }

            pub const fn get(self) -> u64 {
                self.0
            }
        }

        impl From<u64> for $name {
            fn from(id: u64) -> Self {
                Self(id)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

snowflake!(
    /// 服务器（Guild）ID，会话的唯一键
    GuildId
);
snowflake!(
    /// 频道 ID（语音频道或文字频道）
    ChannelId
);
snowflake!(
    /// 用户 ID
    UserId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_and_roundtrip() {
        let id = GuildId::new(1234567890123);
        assert_eq!(id.to_string(), "1234567890123");
        assert_eq!(GuildId::from(id.get()), id);
    }
}
