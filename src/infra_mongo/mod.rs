mod session_adapter_mongo;

pub use session_adapter_mongo::*;
