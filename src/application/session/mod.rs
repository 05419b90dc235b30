//! Voice Session - 服务器级语音会话
//!
//! - gate: 串行化朗读任务的可取消互斥锁
//! - voice_session: 连接生命周期、朗读、停止、销毁
//! - errors: 连接与朗读错误

mod errors;
mod gate;
mod voice_session;

pub use errors::{ConnectError, SpeakError};
pub use gate::{GateCancelled, GatePermit, SpeakGate};
pub use voice_session::{SessionPorts, SessionSettings, VoiceSession};
