use crate::responses::ErrorBody;
use axum::{
    Json,
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Failure of an API call, split into caller mistakes (4xx) and service
/// faults (5xx).
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Uploaded file is empty")]
    EmptyUpload,

    #[error("Uploaded file is empty after writing to disk")]
    EmptyStagedFile,

    #[error("Invalid image file: {0}")]
    InvalidImage(String),

    #[error("Multipart field `file` is required")]
    MissingFile,

    #[error("{detail}")]
    Multipart { status: StatusCode, detail: String },

    #[error("Detection model is not loaded")]
    ModelUnavailable,

    #[error("{0}")]
    Inference(String),

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::EmptyUpload | ApiError::EmptyStagedFile | ApiError::InvalidImage(_) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::MissingFile => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Multipart { status, .. } => *status,
            ApiError::ModelUnavailable | ApiError::Inference(_) | ApiError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn is_client_error(&self) -> bool {
        self.status().is_client_error()
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        ApiError::Multipart {
            status: err.status(),
            detail: err.body_text(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            detail: self.to_string(),
        };
        (self.status(), Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_errors_map_to_4xx() {
        assert_eq!(ApiError::EmptyUpload.status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::EmptyStagedFile.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ApiError::InvalidImage("bad".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::MissingFile.status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert!(ApiError::InvalidImage("bad".into()).is_client_error());
    }

    #[test]
    fn server_errors_map_to_500() {
        for err in [
            ApiError::ModelUnavailable,
            ApiError::Inference("boom".into()),
            ApiError::Internal("disk full".into()),
        ] {
            assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
            assert!(!err.is_client_error());
        }
    }

    #[test]
    fn multipart_errors_keep_their_status() {
        let err = ApiError::Multipart {
            status: StatusCode::PAYLOAD_TOO_LARGE,
            detail: "length limit exceeded".into(),
        };
        assert_eq!(err.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(err.to_string(), "length limit exceeded");
    }

    #[test]
    fn error_display_formatting() {
        assert_eq!(ApiError::EmptyUpload.to_string(), "Uploaded file is empty");
        assert_eq!(
            ApiError::InvalidImage("cannot identify image file".into()).to_string(),
            "Invalid image file: cannot identify image file"
        );
        assert_eq!(
            ApiError::ModelUnavailable.to_string(),
            "Detection model is not loaded"
        );
    }

    #[tokio::test]
    async fn response_carries_detail_body() {
        let response = ApiError::EmptyUpload.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: ErrorBody = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body.detail, "Uploaded file is empty");
    }
}
