use super::{CredentialsRequest, valid_username};
use crate::credentials::{Credentials, UserRepository};
use axum::{
    Json,
    extract::Extension,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error, instrument};
use utoipa::ToSchema;

#[derive(ToSchema, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct SignInResponse {
    pub username: String,
}

#[utoipa::path(
    post,
    path= "/auth/signin",
    request_body = CredentialsRequest,
    responses (
        (status = 200, description = "Credentials are valid", body = SignInResponse, content_type = "application/json"),
        (status = 400, description = "Missing payload"),
        (status = 401, description = "Invalid credentials"),
        (status = 500, description = "Credentials could not be checked"),
    ),
    tag= "auth"
)]
#[instrument(skip(repository, payload))]
pub async fn signin(
    repository: Extension<Arc<UserRepository>>,
    payload: Option<Json<CredentialsRequest>>,
) -> Response {
    let request: CredentialsRequest = match payload {
        Some(Json(payload)) => payload,
        None => return (StatusCode::BAD_REQUEST, "Missing payload").into_response(),
    };

    // Password format is only enforced at sign-up.
    if !valid_username(&request.username) {
        debug!("username fails format check");
        return unauthorized();
    }

    let credentials = Credentials::from(request);

    match repository.validate_user_password(&credentials).await {
        Ok(Some(username)) => {
            debug!("Login successful");
            (StatusCode::OK, Json(SignInResponse { username })).into_response()
        }
        Ok(None) => {
            debug!("Unauthorized");
            unauthorized()
        }
        Err(e) => {
            error!("Error validating credentials: {:?}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Error validating credentials",
            )
                .into_response()
        }
    }
}

fn unauthorized() -> Response {
    (StatusCode::UNAUTHORIZED, "Invalid credentials").into_response()
}
