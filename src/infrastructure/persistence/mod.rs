//! Persistence Layer - 数据持久化
//!
//! SQLite 存储实现：服务器词典与用户音色偏好

pub mod sqlite;

pub use self::sqlite::{create_pool, run_migrations, DatabaseConfig, DbPool};
