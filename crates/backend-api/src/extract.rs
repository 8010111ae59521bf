use axum::{
    extract::{rejection::JsonRejection, FromRequest},
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::ApiError;

/// `axum::Json` whose rejections answer 400 with the usual `{ "message" }` body.
#[derive(Debug, Clone, Copy, Default, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct Json<T>(pub T);

impl<T: Serialize> IntoResponse for Json<T> {
    fn into_response(self) -> Response {
        axum::Json(self.0).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        let message = match rejection {
            JsonRejection::MissingJsonContentType(_) => {
                "Request body must be sent with Content-Type: application/json".to_string()
            }
            other => other.body_text(),
        };
        ApiError::bad_request(message)
    }
}
