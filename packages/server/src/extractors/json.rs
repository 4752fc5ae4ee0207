use axum::{
    Json,
    body::Bytes,
    extract::{FromRequest, OptionalFromRequest, Request, rejection::JsonRejection},
};
use serde::de::DeserializeOwned;

use crate::error::AppError;

/// `Json<T>` whose rejections come back as `VALIDATION_ERROR` bodies instead of
/// axum's plain-text responses.
pub struct AppJson<T>(pub T);

impl<S, T> FromRequest<S> for AppJson<T>
where
    Json<T>: FromRequest<S, Rejection = JsonRejection>,
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match <Json<T> as FromRequest<S>>::from_request(req, state).await {
            Ok(Json(value)) => Ok(AppJson(value)),
            Err(JsonRejection::MissingJsonContentType(_)) => Err(AppError::Validation(
                "Expected a JSON body with Content-Type: application/json".into(),
            )),
            Err(rejection) => Err(AppError::Validation(rejection.body_text())),
        }
    }
}

/// `Option<AppJson<T>>` is `None` for an empty body. A non-empty body is parsed
/// as JSON whatever its content type, and malformed JSON is still rejected.
impl<S, T> OptionalFromRequest<S> for AppJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Option<Self>, Self::Rejection> {
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|rejection| AppError::Validation(rejection.body_text()))?;
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(None);
        }

        Json::<T>::from_bytes(&bytes)
            .map(|Json(value)| Some(AppJson(value)))
            .map_err(|rejection| AppError::Validation(rejection.body_text()))
    }
}
