//! Voice Adapter - songbird 语音连接与播放器

mod songbird_gateway;
mod songbird_player;

pub use songbird_gateway::{SongbirdConnection, SongbirdGateway};
pub use songbird_player::SongbirdPlayer;
