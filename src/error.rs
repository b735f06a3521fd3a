use thiserror::Error;
use wasm_bindgen::JsValue;

/// Failures talking to the profile and image endpoints.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Network(String),

    #[error("server answered {status}: {message}")]
    Status { status: u16, message: String },

    #[error("unexpected response body: {0}")]
    Decode(String),

    #[error("browser API error: {0}")]
    Browser(String),
}

impl From<reqwasm::Error> for ApiError {
    fn from(e: reqwasm::Error) -> Self {
        ApiError::Network(e.to_string())
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(e: serde_json::Error) -> Self {
        ApiError::Decode(e.to_string())
    }
}

impl From<JsValue> for ApiError {
    fn from(e: JsValue) -> Self {
        ApiError::Browser(format!("{:?}", e))
    }
}

/// Failures reading or writing the persisted session.
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("storage unavailable: {0}")]
    Storage(String),

    #[error("failed to serialize user record: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl From<JsValue> for SessionError {
    fn from(e: JsValue) -> Self {
        SessionError::Storage(format!("{:?}", e))
    }
}
