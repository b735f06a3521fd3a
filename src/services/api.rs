use std::rc::Rc;

use async_trait::async_trait;
use reqwasm::http::{Request, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use web_sys::{File, FormData};

use crate::config::AppConfig;
use crate::error::ApiError;
use crate::models::image::{ChangePasswordRequest, DeleteImageRequest};
use crate::models::{ApiReply, ImageList, UserRecord};

pub const USER_INFO_PATH: &str = "/user-info";
pub const CHANGE_PASSWORD_PATH: &str = "/change-password";
pub const GET_IMAGES_PATH: &str = "/get-images";
pub const UPLOAD_IMAGE_PATH: &str = "/upload-image";
pub const DELETE_IMAGE_PATH: &str = "/delete-image";

/// Remote calls made by the profile page.
///
/// `File` is whatever the host hands over for an upload: a browser
/// [`web_sys::File`] in the app, a plain value in tests.
#[async_trait(?Send)]
pub trait ProfileApi {
    type File;

    async fn fetch_current_user(&self, token: &str) -> Result<UserRecord, ApiError>;

    async fn change_password(
        &self,
        current: &str,
        new: &str,
        token: &str,
    ) -> Result<ApiReply, ApiError>;

    async fn list_images(&self, user_id: &str) -> Result<ImageList, ApiError>;

    async fn upload_image(&self, user_id: &str, file: &Self::File) -> Result<ApiReply, ApiError>;

    async fn delete_image(&self, user_id: &str, image_url: &str) -> Result<ApiReply, ApiError>;
}

/// [`ProfileApi`] over `fetch`, via reqwasm.
#[derive(Debug, Clone)]
pub struct HttpProfileApi {
    config: Rc<AppConfig>,
}

impl HttpProfileApi {
    pub fn new(config: Rc<AppConfig>) -> Self {
        Self { config }
    }
}

fn bearer(token: &str) -> String {
    format!("Bearer {}", token)
}

/// Decodes a success-flag body. Error statuses whose body still parses are
/// passed through so the server's message reaches the user.
fn decode_body<T: DeserializeOwned>(status: u16, ok: bool, text: &str) -> Result<T, ApiError> {
    match serde_json::from_str::<T>(text) {
        Ok(body) => Ok(body),
        Err(_) if !ok => Err(ApiError::Status {
            status,
            message: text.to_string(),
        }),
        Err(e) => Err(e.into()),
    }
}

async fn decode_reply<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    let text = response.text().await?;
    decode_body(response.status(), response.ok(), &text)
}

#[derive(Serialize)]
struct ImagesQuery<'a> {
    user_id: &'a str,
}

/// `GET /get-images` URL with the owner id form-encoded into the query.
fn images_url(config: &AppConfig, user_id: &str) -> Result<String, ApiError> {
    let query = serde_urlencoded::to_string(ImagesQuery { user_id })
        .map_err(|e| ApiError::Decode(e.to_string()))?;
    Ok(format!("{}?{}", config.image_api_url(GET_IMAGES_PATH), query))
}

#[async_trait(?Send)]
impl ProfileApi for HttpProfileApi {
    type File = File;

    async fn fetch_current_user(&self, token: &str) -> Result<UserRecord, ApiError> {
        let response = Request::get(&self.config.api_url(USER_INFO_PATH))
            .header("Authorization", &bearer(token))
            .send()
            .await?;
        if !response.ok() {
            return Err(ApiError::Status {
                status: response.status(),
                message: response.status_text(),
            });
        }
        response
            .json::<UserRecord>()
            .await
            .map_err(|e| ApiError::Decode(e.to_string()))
    }

    async fn change_password(
        &self,
        current: &str,
        new: &str,
        token: &str,
    ) -> Result<ApiReply, ApiError> {
        let body = serde_json::to_string(&ChangePasswordRequest {
            current_password: current,
            new_password: new,
        })?;
        let response = Request::post(&self.config.api_url(CHANGE_PASSWORD_PATH))
            .header("Authorization", &bearer(token))
            .header("Content-Type", "application/json")
            .body(body)
            .send()
            .await?;
        decode_reply(response).await
    }

    async fn list_images(&self, user_id: &str) -> Result<ImageList, ApiError> {
        let url = images_url(&self.config, user_id)?;
        let response = Request::get(&url).send().await?;
        decode_reply(response).await
    }

    async fn upload_image(&self, user_id: &str, file: &Self::File) -> Result<ApiReply, ApiError> {
        let form = FormData::new()?;
        form.append_with_blob_and_filename("image", file, &file.name())?;
        form.append_with_str("user_id", user_id)?;
        let response = Request::post(&self.config.image_api_url(UPLOAD_IMAGE_PATH))
            .body(form)
            .send()
            .await?;
        decode_reply(response).await
    }

    async fn delete_image(&self, user_id: &str, image_url: &str) -> Result<ApiReply, ApiError> {
        let body = serde_json::to_string(&DeleteImageRequest { user_id, image_url })?;
        let response = Request::delete(&self.config.image_api_url(DELETE_IMAGE_PATH))
            .header("Content-Type", "application/json")
            .body(body)
            .send()
            .await?;
        decode_reply(response).await
    }
}
