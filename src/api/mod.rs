pub mod axum;
pub mod warp;

mod response;

pub use response::*;
