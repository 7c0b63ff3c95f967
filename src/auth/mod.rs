//! Cookie sessions: bcrypt password checks, HS256 tokens carrying
//! `{userId, role}`, and the `token` cookie that transports them.

pub mod gate;

use std::future::{ready, Ready};

use actix_web::{
    cookie::{time::Duration as CookieDuration, Cookie, SameSite},
    dev::Payload,
    web, FromRequest, HttpMessage, HttpRequest,
};
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::{AdminSeed, Config};
use crate::entities::user::{Role, User};
use crate::errors::{ApiError, RepoErr};
use crate::repositories::UserRepository;
use crate::state::AppState;

pub const TOKEN_COOKIE: &str = "token";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    pub user_id: String,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("token: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),
    #[error("bcrypt: {0}")]
    Hash(#[from] bcrypt::BcryptError),
}

#[derive(Clone)]
pub struct AuthService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl_secs: i64,
    bcrypt_cost: u32,
    secure_cookie: bool,
}

impl AuthService {
    pub fn new(secret: &[u8], ttl_secs: i64, bcrypt_cost: u32, secure_cookie: bool) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            ttl_secs,
            bcrypt_cost,
            secure_cookie,
        }
    }

    pub fn from_config(cfg: &Config) -> Self {
        Self::new(
            cfg.jwt_secret.as_bytes(),
            cfg.session_ttl_secs,
            cfg.bcrypt_cost,
            cfg.cookie_secure,
        )
    }

    /// Blocking; run it on the blocking pool from request handlers.
    pub fn hash_password(&self, plain: &str) -> Result<String, AuthError> {
        Ok(bcrypt::hash(plain, self.bcrypt_cost)?)
    }

    /// Blocking, like `hash_password`. A malformed stored hash counts as a
    /// mismatch.
    pub fn verify_password(&self, plain: &str, hash: &str) -> bool {
        bcrypt::verify(plain, hash).unwrap_or_else(|e| {
            warn!(err = %e, "stored password hash is unreadable");
            false
        })
    }

    pub fn issue_token(&self, user_id: &str, role: Role) -> Result<String, AuthError> {
        let iat = Utc::now().timestamp();
        let claims = Claims {
            user_id: user_id.to_string(),
            role,
            iat,
            exp: iat + self.ttl_secs,
        };
        Ok(encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?)
    }

    pub fn verify_token(&self, token: &str) -> Result<Claims, AuthError> {
        let data = decode::<Claims>(token, &self.decoding, &Validation::new(Algorithm::HS256))?;
        Ok(data.claims)
    }

    /// Session cookie; `Max-Age` matches the token lifetime.
    pub fn session_cookie(&self, token: String) -> Cookie<'static> {
        Cookie::build(TOKEN_COOKIE, token)
            .http_only(true)
            .secure(self.secure_cookie)
            .same_site(SameSite::Strict)
            .path("/")
            .max_age(CookieDuration::seconds(self.ttl_secs))
            .finish()
    }

    pub fn removal_cookie(&self) -> Cookie<'static> {
        let mut c = Cookie::build(TOKEN_COOKIE, "")
            .http_only(true)
            .secure(self.secure_cookie)
            .same_site(SameSite::Strict)
            .path("/")
            .finish();
        c.make_removal();
        c
    }
}

/// Verified session of the caller. The gate stores claims in request
/// extensions; elsewhere the cookie is checked here.
#[derive(Debug, Clone)]
pub struct AuthUser(pub Claims);

impl FromRequest for AuthUser {
    type Error = ApiError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(authenticate(req))
    }
}

fn authenticate(req: &HttpRequest) -> Result<AuthUser, ApiError> {
    if let Some(claims) = req.extensions().get::<Claims>() {
        return Ok(AuthUser(claims.clone()));
    }
    let state = req
        .app_data::<web::Data<AppState>>()
        .ok_or(ApiError::Internal)?;
    let cookie = req
        .cookie(TOKEN_COOKIE)
        .ok_or_else(|| ApiError::Unauthorized("Not authenticated".into()))?;
    state
        .auth
        .verify_token(cookie.value())
        .map(AuthUser)
        .map_err(|_| ApiError::Unauthorized("Invalid token".into()))
}

/// Creates the configured admin unless a user with that email exists.
pub async fn seed_admin(
    users: &dyn UserRepository,
    auth: &AuthService,
    seed: &AdminSeed,
) -> Result<(), RepoErr> {
    if users.find_by_email(&seed.email).await?.is_some() {
        return Ok(());
    }
    let hash = auth
        .hash_password(&seed.password)
        .map_err(|e| RepoErr::Codec(e.to_string()))?;
    let admin = User::new(seed.name.clone(), seed.email.clone(), hash, Role::Admin);
    match users.create(admin).await {
        Ok(u) => {
            info!(email = %u.email, "seeded admin user");
            Ok(())
        }
        Err(RepoErr::Duplicate(_)) => Ok(()),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::in_memory::InMemoryUserRepository;

    fn service() -> AuthService {
        AuthService::new(b"test-secret", 3600, 4, false)
    }

    #[test]
    fn token_round_trip_carries_role() {
        let auth = service();
        let token = auth.issue_token("u-1", Role::Admin).unwrap();
        let claims = auth.verify_token(&token).unwrap();
        assert_eq!(claims.user_id, "u-1");
        assert_eq!(claims.role, Role::Admin);
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let other = AuthService::new(b"another-secret", 3600, 4, false);
        let token = other.issue_token("u-1", Role::User).unwrap();
        assert!(service().verify_token(&token).is_err());
        assert!(service().verify_token("not.a.jwt").is_err());
    }

    #[test]
    fn expired_token_is_rejected() {
        let auth = AuthService::new(b"test-secret", -3600, 4, false);
        let token = auth.issue_token("u-1", Role::User).unwrap();
        assert!(service().verify_token(&token).is_err());
    }

    #[test]
    fn password_hash_verifies() {
        let auth = service();
        let hash = auth.hash_password("hunter22").unwrap();
        assert!(auth.verify_password("hunter22", &hash));
        assert!(!auth.verify_password("hunter23", &hash));
        assert!(!auth.verify_password("hunter22", "garbage"));
    }

    #[test]
    fn cookies() {
        let auth = service();
        let c = auth.session_cookie("abc".into());
        assert_eq!(c.name(), TOKEN_COOKIE);
        assert_eq!(c.http_only(), Some(true));
        assert_eq!(c.same_site(), Some(SameSite::Strict));
        assert_eq!(c.max_age(), Some(CookieDuration::seconds(3600)));
        let gone = auth.removal_cookie();
        assert_eq!(gone.value(), "");
        assert_eq!(gone.max_age(), Some(CookieDuration::ZERO));
    }

    #[tokio::test]
    async fn seed_admin_is_idempotent() {
        let users = InMemoryUserRepository::default();
        let seed = AdminSeed {
            name: "Admin".into(),
            email: "admin@dealer.test".into(),
            password: "changeme".into(),
        };
        seed_admin(&users, &service(), &seed).await.unwrap();
        seed_admin(&users, &service(), &seed).await.unwrap();
        let admin = users.find_by_email("admin@dealer.test").await.unwrap().unwrap();
        assert_eq!(admin.role, Role::Admin);
        assert!(service().verify_password("changeme", &admin.password_hash));
    }
}
