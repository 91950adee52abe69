pub mod admin;
pub mod favorite;
pub mod feedback;
pub mod photo;
pub mod places;
pub mod profile;
pub mod site;
pub mod submission;
pub mod suggest;
pub mod venue;

use crate::error::{AppError, AppResult};
use anyhow::anyhow;
use axum::{
    body::Bytes,
    extract::Multipart,
    http::{header, HeaderValue},
    response::Response,
};

pub(crate) fn append_set_cookie(response: &mut Response, cookie_value: &str) -> AppResult<()> {
    let value = HeaderValue::from_str(cookie_value).map_err(|e| {
        AppError::Internal(anyhow!("Failed to build Set-Cookie header value: {}", e))
    })?;
    response.headers_mut().append(header::SET_COOKIE, value);
    Ok(())
}

/// An uploaded image plus any text fields sent alongside it.
pub(crate) struct ImageUpload {
    pub data: Bytes,
    pub content_type: String,
    pub caption: Option<String>,
}

/// Read a multipart body with a required `file` part and an optional
/// `caption` part. Unknown parts are skipped.
pub(crate) async fn read_image_upload(mut multipart: Multipart) -> AppResult<ImageUpload> {
    let mut file = None;
    let mut caption = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Failed to read upload: {}", e)))?
    {
        match field.name() {
            Some("file") => {
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::Validation(format!("Failed to read file data: {}", e)))?;
                file = Some((data, content_type));
            }
            Some("caption") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::Validation(format!("Failed to read caption: {}", e)))?;
                caption = Some(text);
            }
            _ => {}
        }
    }

    let (data, content_type) =
        file.ok_or_else(|| AppError::Validation("No file provided".to_string()))?;
    Ok(ImageUpload {
        data,
        content_type,
        caption,
    })
}
