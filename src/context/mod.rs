mod auth_context;
mod cookie;

pub use auth_context::*;
pub use cookie::*;
