mod session_adapter;

pub use session_adapter::*;
