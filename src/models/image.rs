use std::fmt;

use serde::{Deserialize, Serialize};

/// Server-assigned image identifier; some backends send it as a number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ImageId {
    Number(i64),
    Text(String),
}

impl fmt::Display for ImageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImageId::Number(n) => write!(f, "{}", n),
            ImageId::Text(s) => f.write_str(s),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageRecord {
    pub id: ImageId,
    pub image_url: String,
}

/// Body of `GET /get-images`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageList {
    #[serde(default)]
    pub is_success: bool,
    #[serde(default)]
    pub images: Vec<ImageRecord>,
}

/// Body shared by the upload, delete and change-password endpoints.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiReply {
    #[serde(default)]
    pub is_success: bool,
    #[serde(default)]
    pub message: Option<String>,
}

impl ApiReply {
    pub fn message_or_empty(&self) -> &str {
        self.message.as_deref().unwrap_or_default()
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteImageRequest<'a> {
    #[serde(rename = "user_id")]
    pub user_id: &'a str,
    pub image_url: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest<'a> {
    pub current_password: &'a str,
    pub new_password: &'a str,
}
