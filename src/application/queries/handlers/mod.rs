//! Query Handlers 实现
//!
//! 所有 QueryHandler 的具体实现

mod dictionary_handlers;
mod preference_handlers;

pub use dictionary_handlers::*;
pub use preference_handlers::*;
