mod expiry;
mod session;

pub use expiry::*;
pub use session::*;
