//! 应用层 - 查询（读操作）
//!
//! CQRS 查询侧：处理所有读操作

mod dictionary_queries;
mod preference_queries;

pub mod handlers;

pub use dictionary_queries::*;
pub use preference_queries::*;
