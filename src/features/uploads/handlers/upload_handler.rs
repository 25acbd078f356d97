use axum::{
    extract::{multipart::MultipartRejection, Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;
use tracing::debug;

use crate::core::error::AppError;
use crate::core::extractor::MaybeUser;
use crate::features::uploads::dtos::{
    IncomingFile, UploadErrorDto, UploadFormDto, UploadResponseDto, MAX_TITLE_LEN,
};
use crate::features::uploads::services::UploadService;

/// Upload failure rendered as `{"error": "..."}`
#[derive(Debug)]
pub struct UploadError {
    status: StatusCode,
    message: String,
}

impl UploadError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    fn no_file() -> Self {
        Self::bad_request("No file provided")
    }
}

impl From<AppError> for UploadError {
    fn from(e: AppError) -> Self {
        Self {
            status: e.status_code(),
            message: e.public_message(),
        }
    }
}

impl IntoResponse for UploadError {
    fn into_response(self) -> Response {
        let body = Json(UploadErrorDto {
            error: self.message,
        });
        (self.status, body).into_response()
    }
}

/// Fields read from the upload form
#[derive(Debug, Default)]
struct UploadForm {
    file: Option<IncomingFile>,
    title: Option<String>,
}

async fn read_form(mut multipart: Multipart) -> Result<UploadForm, UploadError> {
    let mut form = UploadForm::default();

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        debug!("Failed to read multipart field: {}", e);
        UploadError {
            status: e.status(),
            message: e.body_text(),
        }
    })? {
        let field_name = field.name().unwrap_or("").to_string();

        match field_name.as_str() {
            "file" => {
                // A part without a filename is a plain form value, not a file
                let Some(file_name) = field.file_name().map(str::to_string) else {
                    continue;
                };
                let content_type = field
                    .content_type()
                    .map(str::to_string)
                    .unwrap_or_else(|| "application/octet-stream".to_string());
                let data = field.bytes().await.map_err(|e| UploadError {
                    status: e.status(),
                    message: e.body_text(),
                })?;

                form.file = Some(IncomingFile {
                    file_name,
                    content_type,
                    data: data.to_vec(),
                });
            }
            "title" => {
                let text = field.text().await.map_err(|e| UploadError {
                    status: e.status(),
                    message: e.body_text(),
                })?;
                form.title = Some(text);
            }
            _ => {
                debug!("Ignoring unknown field: {}", field_name);
            }
        }
    }

    Ok(form)
}

/// Upload a geodata file
///
/// CSV uploads are also loaded into a new table with one TEXT column per header.
#[utoipa::path(
    post,
    path = "/api/upload/",
    tag = "uploads",
    request_body(
        content = UploadFormDto,
        content_type = "multipart/form-data",
        description = "The file plus an optional title",
    ),
    responses(
        (status = 201, description = "File uploaded successfully", body = UploadResponseDto),
        (status = 400, description = "No file, unsupported extension or invalid title", body = UploadErrorDto),
        (status = 405, description = "Invalid request method", body = UploadErrorDto),
        (status = 413, description = "File too large"),
        (status = 422, description = "CSV could not be loaded", body = UploadErrorDto)
    ),
    security(
        (),
        ("bearer_auth" = [])
    )
)]
pub async fn upload_file(
    MaybeUser(user): MaybeUser,
    State(service): State<Arc<UploadService>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<(StatusCode, Json<UploadResponseDto>), UploadError> {
    let multipart = multipart.map_err(|e| {
        debug!("Upload without a multipart body: {}", e);
        UploadError::no_file()
    })?;

    let form = read_form(multipart).await?;
    let file = form.file.ok_or_else(UploadError::no_file)?;

    let file_type = file
        .allowed_extension()
        .ok_or_else(|| UploadError::bad_request("Invalid file type"))?;

    let title = form
        .title
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| file.default_title());
    if title.chars().count() > MAX_TITLE_LEN {
        return Err(UploadError::bad_request(format!(
            "Title must be at most {} characters",
            MAX_TITLE_LEN
        )));
    }

    let response = service
        .upload(user.map(|u| u.user_id), &title, &file_type, file)
        .await?;

    Ok((StatusCode::CREATED, Json(response)))
}

/// Any method other than POST on the upload endpoint
pub async fn upload_method_not_allowed() -> UploadError {
    UploadError {
        status: StatusCode::METHOD_NOT_ALLOWED,
        message: "Invalid request method".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use axum_test::multipart::{MultipartForm, Part};
    use axum_test::TestServer;
    use serde_json::{json, Value};
    use std::sync::Arc;

    use crate::features::uploads::routes;
    use crate::features::uploads::services::UploadService;
    use crate::shared::test_helpers::{lazy_pool, test_storage};

    fn server() -> TestServer {
        let service = Arc::new(UploadService::new(lazy_pool(), test_storage()));
        TestServer::new(routes::routes(service, 1024 * 1024)).unwrap()
    }

    #[tokio::test]
    async fn test_rejects_unsupported_extension() {
        let form = MultipartForm::new().add_part(
            "file",
            Part::bytes(b"hello".to_vec()).file_name("notes.txt"),
        );

        let response = server().post("/api/upload/").multipart(form).await;
        response.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(response.json::<Value>(), json!({ "error": "Invalid file type" }));
    }

    #[tokio::test]
    async fn test_requires_file_part() {
        let form = MultipartForm::new().add_text("title", "Roads");

        let response = server().post("/api/upload/").multipart(form).await;
        response.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(response.json::<Value>(), json!({ "error": "No file provided" }));
    }

    #[tokio::test]
    async fn test_non_multipart_body_is_missing_file() {
        let response = server()
            .post("/api/upload/")
            .json(&json!({ "file": "roads.csv" }))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(response.json::<Value>()["error"], "No file provided");
    }

    #[tokio::test]
    async fn test_rejects_long_title() {
        let form = MultipartForm::new()
            .add_text("title", "t".repeat(256))
            .add_part(
                "file",
                Part::bytes(b"a,b\n1,2\n".to_vec()).file_name("roads.csv"),
            );

        let response = server().post("/api/upload/").multipart(form).await;
        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_other_methods_are_rejected() {
        let response = server().get("/api/upload/").await;
        response.assert_status(StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(
            response.json::<Value>(),
            json!({ "error": "Invalid request method" })
        );
    }
}
