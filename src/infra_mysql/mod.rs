mod session_adapter_mysql;

pub use session_adapter_mysql::*;
