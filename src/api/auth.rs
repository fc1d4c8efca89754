//! Authentication endpoints

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::staff::Role,
};

use super::AuthenticatedUser;

/// Login request
#[derive(Deserialize, ToSchema)]
pub struct LoginRequest {
    /// Staff username or borrower external id
    pub identifier: String,
    pub password: String,
    /// Optional role hint narrowing the credential pool to search
    pub role: Option<Role>,
}

/// Login response
#[derive(Serialize, ToSchema)]
pub struct LoginResponse {
    pub token: String,
    pub token_type: String,
    pub principal: PrincipalInfo,
}

/// The authenticated principal
#[derive(Serialize, ToSchema)]
pub struct PrincipalInfo {
    pub id: i32,
    pub identifier: String,
    pub name: Option<String>,
    pub role: Role,
}

/// Authenticate and obtain a bearer token
#[utoipa::path(
    post,
    path = "/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Authenticated", body = LoginResponse),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn login(
    State(state): State<crate::AppState>,
    Json(request): Json<LoginRequest>,
) -> AppResult<Json<LoginResponse>> {
    let (token, principal) = state
        .services
        .auth
        .authenticate(&request.identifier, &request.password, request.role)
        .await?;

    Ok(Json(LoginResponse {
        token,
        token_type: "Bearer".to_string(),
        principal: PrincipalInfo {
            id: principal.id,
            identifier: principal.identifier,
            name: principal.name,
            role: principal.role,
        },
    }))
}

/// Password change request
#[derive(Deserialize, Validate, ToSchema)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    #[validate(length(min = 4, message = "Password must be at least 4 characters"))]
    pub new_password: String,
}

/// Change the authenticated principal's own password
#[utoipa::path(
    put,
    path = "/auth/password",
    tag = "auth",
    request_body = ChangePasswordRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 204, description = "Password changed"),
        (status = 400, description = "New password too short"),
        (status = 401, description = "Current password rejected")
    )
)]
pub async fn change_password(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(request): Json<ChangePasswordRequest>,
) -> AppResult<StatusCode> {
    request
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    state
        .services
        .auth
        .change_password(&claims, &request.current_password, &request.new_password)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Return the principal behind the presented token
#[utoipa::path(
    get,
    path = "/auth/me",
    tag = "auth",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Current principal", body = PrincipalInfo),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn me(AuthenticatedUser(claims): AuthenticatedUser) -> Json<PrincipalInfo> {
    Json(PrincipalInfo {
        id: claims.principal_id,
        identifier: claims.sub,
        name: None,
        role: claims.role,
    })
}
