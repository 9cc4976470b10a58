use axum::extract::FromRequest;

use crate::error::AppError;

/// `Json<T>` whose rejection is an [`AppError::Validation`], so a malformed
/// body gets the same `{code, message}` shape as every other 400.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);
