mod session_adapter_redis;

pub use session_adapter_redis::*;
