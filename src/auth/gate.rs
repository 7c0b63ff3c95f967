//! Path-prefix access gate. Only the routes listed in [`PROTECTED`] are
//! checked; everything else passes through untouched.

use actix_web::{
    body::{EitherBody, MessageBody},
    dev::{ServiceRequest, ServiceResponse},
    http::header::LOCATION,
    middleware::Next,
    web, Error, HttpMessage, HttpResponse, ResponseError,
};
use tracing::debug;

use super::{Claims, TOKEN_COOKIE};
use crate::entities::user::Role;
use crate::errors::ApiError;
use crate::state::AppState;

#[derive(Debug, Clone, Copy)]
pub struct ProtectedPath {
    pub prefix: &'static str,
    /// `None` admits any authenticated user.
    pub role: Option<Role>,
}

pub const PROTECTED: &[ProtectedPath] = &[
    ProtectedPath { prefix: "/dashboard", role: None },
    ProtectedPath { prefix: "/create-user", role: Some(Role::Admin) },
    ProtectedPath { prefix: "/api/signup", role: Some(Role::Admin) },
];

pub const LOGIN_PATH: &str = "/login";
pub const UNAUTHORIZED_PATH: &str = "/unauthorized";

#[derive(Debug, PartialEq, Eq)]
pub enum Verdict {
    Open,
    Allow,
    Unauthenticated,
    Forbidden,
}

pub fn rule_for(path: &str) -> Option<&'static ProtectedPath> {
    PROTECTED.iter().find(|p| path.starts_with(p.prefix))
}

pub fn decide(path: &str, claims: Option<&Claims>) -> Verdict {
    let Some(rule) = rule_for(path) else {
        return Verdict::Open;
    };
    match (claims, rule.role) {
        (None, _) => Verdict::Unauthenticated,
        (Some(c), Some(required)) if c.role != required => Verdict::Forbidden,
        (Some(_), _) => Verdict::Allow,
    }
}

pub async fn gate(
    req: ServiceRequest,
    next: Next<impl MessageBody + 'static>,
) -> Result<ServiceResponse<EitherBody<impl MessageBody>>, Error> {
    // The router matches on the percent-decoded path, so the gate must too.
    let path = req.match_info().as_str().to_owned();
    if rule_for(&path).is_none() {
        return next.call(req).await.map(ServiceResponse::map_into_left_body);
    }

    let claims = match (req.app_data::<web::Data<AppState>>(), req.cookie(TOKEN_COOKIE)) {
        (Some(state), Some(cookie)) => state.auth.verify_token(cookie.value()).ok(),
        _ => None,
    };

    match decide(&path, claims.as_ref()) {
        Verdict::Open | Verdict::Allow => {
            if let Some(c) = claims {
                req.extensions_mut().insert(c);
            }
            next.call(req).await.map(ServiceResponse::map_into_left_body)
        }
        Verdict::Unauthenticated => {
            debug!(%path, "no valid session");
            let err = ApiError::Unauthorized("Not authenticated".into());
            Ok(reject(req, &path, err, LOGIN_PATH))
        }
        Verdict::Forbidden => {
            debug!(%path, "role not permitted");
            Ok(reject(req, &path, ApiError::Forbidden, UNAUTHORIZED_PATH))
        }
    }
}

/// API callers get a JSON error; page requests are sent elsewhere.
fn reject<B>(
    req: ServiceRequest,
    path: &str,
    err: ApiError,
    location: &str,
) -> ServiceResponse<EitherBody<B>> {
    let res = if path.starts_with("/api/") {
        err.error_response()
    } else {
        HttpResponse::SeeOther()
            .insert_header((LOCATION, location))
            .finish()
    };
    req.into_response(res).map_into_right_body()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims(role: Role) -> Claims {
        Claims {
            user_id: "u".into(),
            role,
            iat: 0,
            exp: i64::MAX,
        }
    }

    #[test]
    fn unlisted_paths_are_open() {
        assert_eq!(decide("/api/orders", None), Verdict::Open);
        assert_eq!(decide("/login", None), Verdict::Open);
    }

    #[test]
    fn dashboard_needs_any_session() {
        assert_eq!(decide("/dashboard", None), Verdict::Unauthenticated);
        assert_eq!(decide("/dashboard", Some(&claims(Role::User))), Verdict::Allow);
        assert_eq!(decide("/dashboard/x", Some(&claims(Role::Admin))), Verdict::Allow);
    }

    #[test]
    fn admin_routes_check_role() {
        for path in ["/create-user", "/api/signup"] {
            assert_eq!(decide(path, None), Verdict::Unauthenticated);
            assert_eq!(decide(path, Some(&claims(Role::User))), Verdict::Forbidden);
            assert_eq!(decide(path, Some(&claims(Role::Admin))), Verdict::Allow);
        }
    }
}
