//! Request body extractors for property mutations.
//!
//! Create and update accept either `multipart/form-data` (text parts plus
//! photo files) or a JSON body. Both are folded into a [`PropertyForm`] so
//! the service sees a single typed input.

use axum::{
    extract::{FromRequest, FromRequestParts, Multipart, Path, Request},
    http::{header::CONTENT_TYPE, request::Parts},
    Json,
};
use serde::de::DeserializeOwned;

use realty_core::{PropertyForm, UploadedFile};

use crate::error::ApiError;

/// Multipart part names carrying property photos.
pub const PHOTO_FIELDS: &[&str] = &["photos"];

/// Multipart part names accepted by the image upload endpoint.
pub const IMAGE_FIELDS: &[&str] = &["images", "photos"];

/// Create/update payload with any attached photos.
#[derive(Debug, Default)]
pub struct PropertyPayload {
    pub form: PropertyForm,
    pub files: Vec<UploadedFile>,
}

/// Files posted to the image upload endpoint.
#[derive(Debug, Default)]
pub struct ImageUpload {
    pub files: Vec<UploadedFile>,
}

/// JSON body whose rejections use the API error format.
#[derive(Debug, Clone)]
pub struct JsonBody<T>(pub T);

/// Integer `:id` path segment; a malformed id is a JSON 400.
#[derive(Debug, Clone, Copy)]
pub struct PropertyId(pub i32);

#[axum::async_trait]
impl<S> FromRequestParts<S> for PropertyId
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(id) = Path::<i32>::from_request_parts(parts, state)
            .await
            .map_err(|e| {
                ApiError::BadRequest(format!("Invalid property id: {}", e.body_text()))
            })?;
        Ok(Self(id))
    }
}

#[axum::async_trait]
impl<S, T> FromRequest<S> for JsonBody<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        Json::<T>::from_request(req, state)
            .await
            .map(|Json(value)| JsonBody(value))
            .map_err(|e| ApiError::BadRequest(e.body_text()))
    }
}

fn is_multipart(req: &Request) -> bool {
    req.headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(|ct| ct.starts_with("multipart/form-data"))
        .unwrap_or(false)
}

/// Split a multipart body into text parts and files from `file_fields`.
///
/// File parts under other names are dropped, as are empty file parts
/// (browsers send one when no file was chosen).
async fn read_multipart(
    mut multipart: Multipart,
    file_fields: &[&str],
) -> Result<(Vec<(String, String)>, Vec<UploadedFile>), ApiError> {
    let mut texts = Vec::new();
    let mut files = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Failed to read upload: {}", e)))?
    {
        let name = field.name().unwrap_or_default().to_string();
        let base_name = name.trim_end_matches("[]");

        match field.file_name().map(str::to_string) {
            Some(file_name) => {
                if !file_fields.contains(&base_name) {
                    continue;
                }
                let content_type = field.content_type().map(str::to_string);
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("Failed to read file data: {}", e)))?;
                if data.is_empty() {
                    continue;
                }
                files.push(UploadedFile {
                    file_name,
                    content_type,
                    data: data.to_vec(),
                });
            }
            None => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("Failed to read field: {}", e)))?;
                texts.push((name, value));
            }
        }
    }

    Ok((texts, files))
}

#[axum::async_trait]
impl<S> FromRequest<S> for PropertyPayload
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        if is_multipart(&req) {
            let multipart = Multipart::from_request(req, state)
                .await
                .map_err(|e| ApiError::BadRequest(e.body_text()))?;
            let (texts, files) = read_multipart(multipart, PHOTO_FIELDS).await?;
            return Ok(Self {
                form: PropertyForm::from_text_fields(texts),
                files,
            });
        }

        let JsonBody(form) = JsonBody::<PropertyForm>::from_request(req, state).await?;
        Ok(Self {
            form,
            files: Vec::new(),
        })
    }
}

#[axum::async_trait]
impl<S> FromRequest<S> for ImageUpload
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        if !is_multipart(&req) {
            return Err(ApiError::BadRequest(
                "Expected multipart/form-data with image files".to_string(),
            ));
        }
        let multipart = Multipart::from_request(req, state)
            .await
            .map_err(|e| ApiError::BadRequest(e.body_text()))?;
        let (_, files) = read_multipart(multipart, IMAGE_FIELDS).await?;
        Ok(Self { files })
    }
}
