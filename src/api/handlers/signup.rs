use super::{CredentialsRequest, valid_password, valid_username};
use crate::credentials::{CredentialError, Credentials, UserRepository};
use axum::{Json, extract::Extension, http::StatusCode, response::IntoResponse};
use std::sync::Arc;
use tracing::{debug, error, instrument};

#[utoipa::path(
    post,
    path= "/auth/signup",
    request_body = CredentialsRequest,
    responses (
        (status = 201, description = "User created"),
        (status = 400, description = "Missing or malformed username or password"),
        (status = 409, description = "User with the specified username already exists"),
        (status = 500, description = "User could not be stored"),
    ),
    tag= "auth"
)]
#[instrument(skip(repository, payload))]
pub async fn signup(
    repository: Extension<Arc<UserRepository>>,
    payload: Option<Json<CredentialsRequest>>,
) -> impl IntoResponse {
    let request: CredentialsRequest = match payload {
        Some(Json(payload)) => payload,
        None => return (StatusCode::BAD_REQUEST, "Missing payload".to_string()),
    };

    debug!("request: {:?}", request);

    if !valid_username(&request.username) {
        return (StatusCode::BAD_REQUEST, "Invalid username".to_string());
    }

    if !valid_password(&request.password) {
        return (StatusCode::BAD_REQUEST, "Invalid password".to_string());
    }

    let credentials = Credentials::from(request);

    match repository.sign_up(&credentials).await {
        Ok(()) => (StatusCode::CREATED, "User created".to_string()),
        Err(CredentialError::DuplicateUsername) => {
            (StatusCode::CONFLICT, "User already exists".to_string())
        }
        Err(e) => {
            error!("Error signing up user: {:?}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Error creating user".to_string(),
            )
        }
    }
}
