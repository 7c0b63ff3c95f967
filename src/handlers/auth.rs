use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use tracing::{error, info, warn};

use crate::auth::{AuthError, AuthUser};
use crate::entities::user::{NewUser, PublicUser, Role, User};
use crate::errors::ApiError;
use crate::state::AppState;
use crate::validation::validate_user;

#[derive(Debug, Deserialize)]
pub struct LoginPayload {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

fn auth_failure(e: AuthError) -> ApiError {
    error!(err = %e, "auth backend failure");
    ApiError::Internal
}

/// Runs bcrypt off the async workers.
async fn blocking<T, F>(f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    web::block(f).await.map_err(|e| {
        error!(err = %e, "blocking task failed");
        ApiError::Internal
    })
}

pub async fn login(
    state: web::Data<AppState>,
    payload: web::Json<LoginPayload>,
) -> Result<HttpResponse, ApiError> {
    let LoginPayload { email, password } = payload.into_inner();
    let email = email.trim().to_string();
    if email.is_empty() || password.is_empty() {
        return Err(ApiError::BadRequest("Missing required fields".into()));
    }

    let user = state.users.find_by_email(&email).await?;
    let verified = match &user {
        Some(u) => {
            let (auth, hash) = (state.auth.clone(), u.password_hash.clone());
            blocking(move || auth.verify_password(&password, &hash)).await?
        }
        None => false,
    };
    let Some(user) = user.filter(|_| verified) else {
        warn!(%email, "rejected login");
        return Err(ApiError::Unauthorized("Invalid credentials".into()));
    };

    let token = state
        .auth
        .issue_token(&user.id, user.role)
        .map_err(auth_failure)?;
    info!(user_id = %user.id, role = %user.role, "login");
    Ok(HttpResponse::Ok()
        .cookie(state.auth.session_cookie(token))
        .json(json!({ "role": user.role })))
}

pub async fn check_auth(user: AuthUser) -> HttpResponse {
    HttpResponse::Ok().json(json!({ "role": user.0.role }))
}

pub async fn logout(state: web::Data<AppState>) -> HttpResponse {
    HttpResponse::Ok()
        .cookie(state.auth.removal_cookie())
        .json(json!({ "success": true }))
}

/// Admin-only. The gate turns most callers away first; the role is checked
/// here as well so the route is safe without it.
pub async fn signup(
    state: web::Data<AppState>,
    caller: AuthUser,
    payload: web::Json<NewUser>,
) -> Result<HttpResponse, ApiError> {
    if caller.0.role != Role::Admin {
        warn!(user_id = %caller.0.user_id, "non-admin signup attempt");
        return Err(ApiError::Forbidden);
    }
    let NewUser {
        name,
        email,
        password,
        role,
    } = payload.into_inner();
    let candidate = NewUser {
        name: name.trim().to_string(),
        email: email.trim().to_string(),
        password,
        role,
    };
    validate_user(&candidate)?;

    let auth = state.auth.clone();
    let plain = candidate.password;
    let hash = blocking(move || auth.hash_password(&plain))
        .await?
        .map_err(auth_failure)?;

    let user = state
        .users
        .create(User::new(candidate.name, candidate.email, hash, candidate.role))
        .await?;
    info!(user_id = %user.id, role = %user.role, "user created");
    Ok(HttpResponse::Created().json(json!({ "success": true, "data": PublicUser::from(&user) })))
}
