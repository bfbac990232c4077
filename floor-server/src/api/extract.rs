//! Request body extraction
//!
//! [`Payload`] is `Json` with rejections rendered as our error envelope, so a
//! malformed body is a `ValidationFailed` 400 like any other bad input.
//! [`PathParam`] does the same for path segments (`InvalidRequest` 400).

use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, FromRequestParts, Json, Path, Request};
use http::request::Parts;
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::utils::{AppError, AppResult};

pub struct Payload<T>(pub T);

impl<S, T> FromRequest<S> for Payload<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Payload(value)),
            Err(rejection) => Err(rejection_to_error(rejection)),
        }
    }
}

pub struct PathParam<T>(pub T);

impl<S, T> FromRequestParts<S> for PathParam<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Path::<T>::from_request_parts(parts, state).await {
            Ok(Path(value)) => Ok(PathParam(value)),
            Err(rejection) => Err(AppError::invalid_request(rejection.body_text())),
        }
    }
}

fn rejection_to_error(rejection: JsonRejection) -> AppError {
    tracing::debug!(error = %rejection, "Rejected request body");
    AppError::validation(rejection.body_text())
}

/// Run derive-based field checks, listing failing fields in `details`
pub fn validate<T: Validate>(payload: &T) -> AppResult<()> {
    let Err(errors) = payload.validate() else {
        return Ok(());
    };

    let mut err = AppError::validation(format!("Invalid fields: {}", field_list(&errors)));
    for (field, list) in errors.field_errors() {
        let codes: Vec<String> = list.iter().map(|e| e.code.to_string()).collect();
        err = err.with_detail(field.to_string(), codes);
    }
    Err(err)
}

fn field_list(errors: &validator::ValidationErrors) -> String {
    let mut fields: Vec<String> = errors
        .field_errors()
        .keys()
        .map(|k| k.to_string())
        .collect();
    fields.sort();
    fields.join(", ")
}
