mod session_adapter_memory;

pub use session_adapter_memory::*;
