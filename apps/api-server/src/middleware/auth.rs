//! Authentication middleware and extractors.
//!
//! Every request to a guarded path runs the same pipeline: public-path
//! check, token extraction (bearer header, then cookie), verification,
//! revocation lookup, principal load, and route authorization. Cheap local
//! checks run before anything that touches a store, and only authorization
//! denials reach the audit sink - routine expired-token noise does not.

use std::future::{Future, Ready, ready};
use std::pin::Pin;
use std::rc::Rc;

use actix_web::{
    Error, FromRequest, HttpMessage, HttpRequest, HttpResponse,
    body::EitherBody,
    dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
    http::{StatusCode, header},
};
use chrono::Utc;

use bazaar_core::domain::{Principal, Role};
use bazaar_core::ports::{AccessClaims, AuthError, SecurityEvent, SecurityEventKind};
use bazaar_shared::ErrorBody;

use crate::state::AppState;

/// Authentication middleware factory.
pub struct AuthMiddleware {
    state: AppState,
}

impl AuthMiddleware {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }
}

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = AuthMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthMiddlewareService {
            service: Rc::new(service),
            state: self.state.clone(),
        }))
    }
}

pub struct AuthMiddlewareService<S> {
    service: Rc<S>,
    state: AppState,
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let method = req.method().as_str().to_string();
        let path = req.path().to_string();

        // Public routes and the implicitly-public surface skip the pipeline.
        if self.state.policy.is_public(&method, &path) || !self.state.policy.is_guarded(&path) {
            let fut = self.service.call(req);
            return Box::pin(async move { Ok(fut.await?.map_into_left_body()) });
        }

        let state = self.state.clone();
        let service = Rc::clone(&self.service);

        Box::pin(async move {
            let outcome = resolve_principal(&state, req.request(), &method, &path).await;
            match outcome {
                Ok((principal, claims)) => {
                    req.extensions_mut().insert(CurrentUser(principal));
                    req.extensions_mut().insert(CurrentClaims(claims));
                    Ok(service.call(req).await?.map_into_left_body())
                }
                Err(denied) => {
                    let response = denied.into_response(&path);
                    Ok(req.into_response(response).map_into_right_body())
                }
            }
        })
    }
}

/// A denial plus the role it was issued against (known only past the
/// principal-load step; drives the cross-role redirect).
struct Denied {
    error: AuthError,
    role: Option<Role>,
}

impl Denied {
    fn of(error: AuthError) -> Self {
        Self { error, role: None }
    }

    fn into_response(self, path: &str) -> HttpResponse {
        let status =
            StatusCode::from_u16(self.error.status()).unwrap_or(StatusCode::UNAUTHORIZED);

        if path.starts_with("/api/") {
            return HttpResponse::build(status).json(ErrorBody::new(self.error.to_string()));
        }

        // Staff denied a customer page belong on their own dashboard.
        if matches!(self.error, AuthError::PolicyDenied { .. })
            && self.role.is_some_and(Role::is_staff)
        {
            return HttpResponse::Found()
                .insert_header((header::LOCATION, "/admin/dashboard"))
                .finish();
        }

        let location = format!(
            "/login?error={}&message={}&redirect={}",
            error_code(&self.error),
            urlencoding::encode(&self.error.to_string()),
            urlencoding::encode(path),
        );
        HttpResponse::Found()
            .insert_header((header::LOCATION, location))
            .finish()
    }
}

fn error_code(error: &AuthError) -> &'static str {
    match error {
        AuthError::NoToken | AuthError::UnknownPrincipal => "unauthenticated",
        AuthError::InvalidToken => "invalid_token",
        AuthError::Revoked => "revoked",
        AuthError::LockedAccount => "locked",
        AuthError::PolicyDenied { .. } => "forbidden",
        AuthError::Hashing(_) => "error",
    }
}

fn bearer_token(req: &HttpRequest) -> Option<String> {
    req.headers()
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::to_string)
}

fn cookie_token(req: &HttpRequest) -> Option<String> {
    req.cookie("token").map(|c| c.value().to_string())
}

async fn resolve_principal(
    state: &AppState,
    req: &HttpRequest,
    method: &str,
    path: &str,
) -> Result<(Principal, AccessClaims), Denied> {
    let token = bearer_token(req)
        .or_else(|| cookie_token(req))
        .ok_or_else(|| Denied::of(AuthError::NoToken))?;

    let claims = state
        .tokens
        .verify_access_token(&token)
        .map_err(Denied::of)?;

    match state.revocations.is_revoked(claims.jti).await {
        Ok(true) => return Err(Denied::of(AuthError::Revoked)),
        Ok(false) => {}
        // Fail open: a revocation-store outage must not log everyone out.
        Err(error) => {
            tracing::warn!(%error, "revocation lookup failed; treating token as live");
        }
    }

    let user = state
        .users
        .find_by_id(claims.sub)
        .await
        .map_err(|error| {
            tracing::error!(%error, "user lookup failed");
            Denied::of(AuthError::UnknownPrincipal)
        })?
        .ok_or_else(|| Denied::of(AuthError::UnknownPrincipal))?;

    if user.is_locked(Utc::now()) {
        return Err(Denied::of(AuthError::LockedAccount));
    }

    let principal = user.principal();
    let verdict = state.policy.authorize(principal.role, method, path);
    if !verdict.allowed {
        state
            .audit
            .record(SecurityEvent {
                actor: Some(principal.id),
                kind: SecurityEventKind::UnauthorizedAccess,
                ip: req
                    .connection_info()
                    .realip_remote_addr()
                    .unwrap_or("unknown")
                    .to_string(),
                user_agent: req
                    .headers()
                    .get(header::USER_AGENT)
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("unknown")
                    .to_string(),
                method: method.to_string(),
                path: path.to_string(),
                missing_permissions: verdict.missing.clone(),
                at: Utc::now(),
            })
            .await;

        return Err(Denied {
            error: AuthError::PolicyDenied {
                missing: verdict.missing,
            },
            role: Some(principal.role),
        });
    }

    Ok((principal, claims))
}

/// The resolved principal, attached by the middleware.
///
/// Use this in handlers behind guarded paths:
/// ```ignore
/// async fn handler(user: CurrentUser) -> impl Responder {
///     format!("Hello, {}!", user.0.name)
/// }
/// ```
#[derive(Debug, Clone)]
pub struct CurrentUser(pub Principal);

/// The verified claims of the presented token, attached by the middleware.
#[derive(Debug, Clone)]
pub struct CurrentClaims(pub AccessClaims);

/// Extractor failure: the middleware did not attach an identity.
#[derive(Debug)]
pub struct AuthRejection(pub AuthError);

impl std::fmt::Display for AuthRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl actix_web::ResponseError for AuthRejection {
    fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.0.status()).unwrap_or(StatusCode::UNAUTHORIZED)
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(ErrorBody::new(self.0.to_string()))
    }
}

impl FromRequest for CurrentUser {
    type Error = AuthRejection;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut actix_web::dev::Payload) -> Self::Future {
        ready(
            req.extensions()
                .get::<CurrentUser>()
                .cloned()
                .ok_or(AuthRejection(AuthError::NoToken)),
        )
    }
}

impl FromRequest for CurrentClaims {
    type Error = AuthRejection;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut actix_web::dev::Payload) -> Self::Future {
        ready(
            req.extensions()
                .get::<CurrentClaims>()
                .cloned()
                .ok_or(AuthRejection(AuthError::NoToken)),
        )
    }
}
