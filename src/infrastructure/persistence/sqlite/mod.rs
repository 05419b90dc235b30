//! SQLite Persistence - SQLite 数据库持久化实现

mod database;
mod dictionary_repo;
mod preference_repo;

pub use database::*;
pub use dictionary_repo::*;
pub use preference_repo::*;
