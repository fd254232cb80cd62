use crate::domain_port::SessionError;
use serde::Serialize;

/// The uniform wire shape for operation outcomes: `{success, data}` or
/// `{success, message}`. Adapter failures become values here, never HTTP
/// errors; application code decides the status.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        ApiResponse {
            success: true,
            data: Some(data),
            message: None,
        }
    }

    pub fn err(error: &SessionError) -> Self {
        ApiResponse {
            success: false,
            data: None,
            message: Some(error.to_string()),
        }
    }

    pub fn from_result(result: Result<T, SessionError>) -> Self {
        match result {
            Ok(data) => Self::ok(data),
            Err(error) => Self::err(&error),
        }
    }
}
