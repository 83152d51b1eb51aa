//! HTTP error mapping for the API.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use thiserror::Error;

use fetch::FetchError;
use raster::RasterError;
use renderer::RenderError;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    BadRequest(String),

    #[error(transparent)]
    Raster(#[from] RasterError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("{0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Raster(RasterError::NotFound(_)) => StatusCode::NOT_FOUND,
            ApiError::Render(RenderError::TileOutOfBounds { .. }) => StatusCode::NOT_FOUND,
            ApiError::Render(RenderError::InvalidTile { .. }) => StatusCode::BAD_REQUEST,
            ApiError::Fetch(FetchError::UpstreamUnavailable(_))
            | ApiError::Fetch(FetchError::AssetNotListed { .. }) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }

        (
            status,
            Json(serde_json::json!({ "detail": self.to_string() })),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_status_mapping() {
        let resp = ApiError::NotFound("missing".to_string()).into_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let resp = ApiError::Raster(RasterError::NotFound(PathBuf::from("x.tif"))).into_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let resp =
            ApiError::Render(RenderError::TileOutOfBounds { z: 5, x: 0, y: 0 }).into_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let resp =
            ApiError::Fetch(FetchError::UpstreamUnavailable("timeout".to_string())).into_response();
        assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);

        let resp = ApiError::Raster(RasterError::ReadFailed("corrupt".to_string())).into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let resp = ApiError::Internal("task cancelled".to_string()).into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
