//! Authentication handlers.

use std::time::Duration;

use actix_web::cookie::{Cookie, SameSite, time::Duration as CookieDuration};
use actix_web::{HttpRequest, HttpResponse, web};
use chrono::{TimeDelta, Utc};

use bazaar_core::domain::{Role, User};
use bazaar_core::ports::{RefreshTokenRecord, SecurityEvent, SecurityEventKind};
use bazaar_shared::dto::{
    AuthResponse, LoginRequest, RefreshRequest, RefreshResponse, RegisterRequest, UserResponse,
};

use crate::middleware::auth::{CurrentClaims, CurrentUser};
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

const MIN_PASSWORD_LEN: usize = 10;
const SESSION_COOKIE_MAX_AGE_SECS: i64 = 86400;

/// POST /api/auth/register
pub async fn register(
    state: web::Data<AppState>,
    body: web::Json<RegisterRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();

    if req.email.is_empty() || !req.email.contains('@') {
        return Err(AppError::BadRequest("Invalid email address".to_string()));
    }
    if req.password.len() < MIN_PASSWORD_LEN {
        return Err(AppError::BadRequest(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    if req.name.trim().is_empty() {
        return Err(AppError::BadRequest("Name is required".to_string()));
    }

    if state.users.find_by_email(&req.email).await?.is_some() {
        return Err(AppError::Conflict("Email already registered".to_string()));
    }

    let password_hash = state.passwords.hash(&req.password)?;
    let user = state
        .users
        .save(User::new(req.email, req.name, password_hash, Role::Customer))
        .await?;

    let (response, cookie) = issue_session(&state, &user).await?;
    Ok(HttpResponse::Created().cookie(cookie).json(response))
}

/// POST /api/auth/login
pub async fn login(
    state: web::Data<AppState>,
    http_req: HttpRequest,
    body: web::Json<LoginRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    let now = Utc::now();

    let user = state
        .users
        .find_by_email(&req.email)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Invalid email or password".to_string()))?;

    if user.is_locked(now) {
        return Err(AppError::Unauthorized("Account is locked".to_string()));
    }

    let valid = state.passwords.verify(&req.password, &user.password_hash)?;
    if !valid {
        let failures = state.users.record_login_failure(user.id).await?;
        if failures >= state.security.max_failed_logins {
            let until = now
                + TimeDelta::from_std(state.security.lockout)
                    .unwrap_or_else(|_| TimeDelta::minutes(30));
            state.users.lock_until(user.id, until).await?;

            state
                .audit
                .record(SecurityEvent {
                    actor: Some(user.id),
                    kind: SecurityEventKind::AccountLocked,
                    ip: client_ip(&http_req),
                    user_agent: user_agent(&http_req),
                    method: "POST".to_string(),
                    path: "/api/auth/login".to_string(),
                    missing_permissions: Vec::new(),
                    at: now,
                })
                .await;
            tracing::warn!(user = %user.id, failures, "account locked after repeated login failures");
        }
        return Err(AppError::Unauthorized(
            "Invalid email or password".to_string(),
        ));
    }

    state.users.clear_login_failures(user.id).await?;

    let (response, cookie) = issue_session(&state, &user).await?;
    Ok(HttpResponse::Ok().cookie(cookie).json(response))
}

/// POST /api/auth/refresh
pub async fn refresh(
    state: web::Data<AppState>,
    body: web::Json<RefreshRequest>,
) -> AppResult<HttpResponse> {
    let now = Utc::now();
    let hash = state.tokens.hash_opaque_token(&body.refresh_token);

    let record = state
        .refresh_tokens
        .find_by_hash(&hash)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Invalid refresh token".to_string()))?;

    if record.revoked_at.is_some() || record.expires_at <= now {
        return Err(AppError::Unauthorized("Invalid refresh token".to_string()));
    }

    let user = state
        .users
        .find_by_id(record.user_id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("User not found".to_string()))?;

    if user.is_locked(now) {
        return Err(AppError::Unauthorized("Account is locked".to_string()));
    }

    let access_token = state.tokens.issue_access_token(&user.principal())?;
    let cookie = session_cookie(&access_token, state.security.cookie_secure);

    Ok(HttpResponse::Ok().cookie(cookie).json(RefreshResponse {
        access_token,
        token_type: "Bearer".to_string(),
        expires_in: state.tokens.access_ttl().as_secs(),
    }))
}

/// POST /api/auth/logout - revokes the presented access token for its
/// remaining lifetime and every refresh token the user holds.
pub async fn logout(
    state: web::Data<AppState>,
    user: CurrentUser,
    claims: CurrentClaims,
) -> AppResult<HttpResponse> {
    let remaining = (claims.0.exp - Utc::now().timestamp()).max(1) as u64;
    if let Err(error) = state
        .revocations
        .revoke(claims.0.jti, Duration::from_secs(remaining))
        .await
    {
        tracing::warn!(%error, "failed to revoke access token");
    }

    state.refresh_tokens.revoke_all_for_user(user.0.id).await?;

    let mut removal = Cookie::new("token", "");
    removal.set_path("/");
    removal.make_removal();

    Ok(HttpResponse::Ok()
        .cookie(removal)
        .json(serde_json::json!({ "success": true })))
}

/// GET /api/auth/me
pub async fn me(user: CurrentUser) -> AppResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(UserResponse {
        id: user.0.id.to_string(),
        email: user.0.email,
        name: user.0.name,
        role: user.0.role.as_str().to_string(),
    }))
}

async fn issue_session(
    state: &AppState,
    user: &User,
) -> AppResult<(AuthResponse, Cookie<'static>)> {
    let principal = user.principal();
    let access_token = state.tokens.issue_access_token(&principal)?;
    let refresh = state.tokens.issue_refresh_token();

    let now = Utc::now();
    state
        .refresh_tokens
        .save(RefreshTokenRecord {
            jti: refresh.jti,
            user_id: user.id,
            token_hash: state.tokens.hash_opaque_token(&refresh.token),
            issued_at: now,
            expires_at: now
                + TimeDelta::from_std(state.tokens.refresh_ttl())
                    .unwrap_or_else(|_| TimeDelta::days(14)),
            revoked_at: None,
        })
        .await?;

    let cookie = session_cookie(&access_token, state.security.cookie_secure);
    let response = AuthResponse {
        access_token,
        refresh_token: refresh.token,
        token_type: "Bearer".to_string(),
        expires_in: state.tokens.access_ttl().as_secs(),
        user: UserResponse {
            id: user.id.to_string(),
            email: user.email.clone(),
            name: user.name.clone(),
            role: user.role.as_str().to_string(),
        },
    };

    Ok((response, cookie))
}

fn session_cookie(token: &str, secure: bool) -> Cookie<'static> {
    Cookie::build("token", token.to_string())
        .path("/")
        .max_age(CookieDuration::seconds(SESSION_COOKIE_MAX_AGE_SECS))
        .same_site(SameSite::Lax)
        .http_only(true)
        .secure(secure)
        .finish()
}

fn client_ip(req: &HttpRequest) -> String {
    req.connection_info()
        .realip_remote_addr()
        .unwrap_or("unknown")
        .to_string()
}

fn user_agent(req: &HttpRequest) -> String {
    req.headers()
        .get(actix_web::http::header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use actix_web::{App, http::StatusCode, http::header, test};

    use bazaar_core::domain::ListKind;
    use bazaar_core::ports::RateLimiter;
    use bazaar_core::rbac::RbacPolicy;
    use bazaar_infra::audit::InMemoryAudit;
    use bazaar_infra::auth::{Argon2PasswordService, HsTokenService, JwtConfig};
    use bazaar_infra::rate_limit::{KeyedRateLimiter, RateLimitConfig};
    use bazaar_infra::revocation::InMemoryRevocationStore;
    use bazaar_infra::store::{InMemoryItemStore, InMemoryRefreshTokenStore, InMemoryUserStore};
    use bazaar_shared::ErrorBody;

    use crate::config::SecuritySettings;
    use crate::handlers::configure_routes;
    use crate::middleware::auth::AuthMiddleware;

    fn test_state(audit: Arc<InMemoryAudit>) -> AppState {
        AppState {
            tokens: Arc::new(HsTokenService::new(JwtConfig {
                secret: "test-secret-key".to_string(),
                ..JwtConfig::default()
            })),
            passwords: Arc::new(Argon2PasswordService::new()),
            revocations: Arc::new(InMemoryRevocationStore::new()),
            users: Arc::new(InMemoryUserStore::new()),
            refresh_tokens: Arc::new(InMemoryRefreshTokenStore::new()),
            cart: Arc::new(InMemoryItemStore::new(ListKind::Cart)),
            wishlist: Arc::new(InMemoryItemStore::new(ListKind::Wishlist)),
            audit,
            policy: Arc::new(RbacPolicy::new()),
            security: SecuritySettings::default(),
        }
    }

    macro_rules! test_app {
        ($state:expr) => {{
            let limiter: Arc<dyn RateLimiter> =
                Arc::new(KeyedRateLimiter::new(RateLimitConfig {
                    max_requests: 1000,
                    window: std::time::Duration::from_secs(60),
                }));
            test::init_service(
                App::new()
                    .wrap(AuthMiddleware::new($state.clone()))
                    .app_data(web::Data::new($state.clone()))
                    .configure(configure_routes(limiter)),
            )
            .await
        }};
    }

    fn register_body() -> serde_json::Value {
        serde_json::json!({
            "email": "shopper@example.com",
            "password": "correct horse battery",
            "name": "Shopper"
        })
    }

    fn login_body(password: &str) -> serde_json::Value {
        serde_json::json!({ "email": "shopper@example.com", "password": password })
    }

    #[actix_web::test]
    async fn register_then_me_round_trip() {
        let state = test_state(Arc::new(InMemoryAudit::new()));
        let app = test_app!(state);

        let req = test::TestRequest::post()
            .uri("/api/auth/register")
            .set_json(register_body())
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);

        let auth: AuthResponse = test::read_body_json(resp).await;
        assert_eq!(auth.token_type, "Bearer");
        assert_eq!(auth.expires_in, 15 * 60);
        assert_eq!(auth.user.role, "customer");
        assert!(!auth.refresh_token.is_empty());

        let req = test::TestRequest::get()
            .uri("/api/auth/me")
            .insert_header((header::AUTHORIZATION, format!("Bearer {}", auth.access_token)))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let me: UserResponse = test::read_body_json(resp).await;
        assert_eq!(me.email, "shopper@example.com");
    }

    #[actix_web::test]
    async fn register_validates_input() {
        let state = test_state(Arc::new(InMemoryAudit::new()));
        let app = test_app!(state);

        let req = test::TestRequest::post()
            .uri("/api/auth/register")
            .set_json(serde_json::json!({
                "email": "shopper@example.com",
                "password": "short",
                "name": "Shopper"
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        // Duplicate registration conflicts.
        for expected in [StatusCode::CREATED, StatusCode::CONFLICT] {
            let req = test::TestRequest::post()
                .uri("/api/auth/register")
                .set_json(register_body())
                .to_request();
            assert_eq!(test::call_service(&app, req).await.status(), expected);
        }
    }

    #[actix_web::test]
    async fn login_sets_the_session_cookie() {
        let state = test_state(Arc::new(InMemoryAudit::new()));
        let app = test_app!(state);

        let req = test::TestRequest::post()
            .uri("/api/auth/register")
            .set_json(register_body())
            .to_request();
        test::call_service(&app, req).await;

        let req = test::TestRequest::post()
            .uri("/api/auth/login")
            .set_json(login_body("correct horse battery"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let cookie = resp
            .response()
            .cookies()
            .find(|c| c.name() == "token")
            .expect("session cookie set");
        assert_eq!(cookie.path(), Some("/"));
        assert_eq!(cookie.same_site(), Some(SameSite::Lax));
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(
            cookie.max_age(),
            Some(CookieDuration::seconds(SESSION_COOKIE_MAX_AGE_SECS))
        );
    }

    #[actix_web::test]
    async fn repeated_failures_lock_the_account() {
        let audit = Arc::new(InMemoryAudit::new());
        let state = test_state(audit.clone());
        let app = test_app!(state);

        let req = test::TestRequest::post()
            .uri("/api/auth/register")
            .set_json(register_body())
            .to_request();
        test::call_service(&app, req).await;

        for _ in 0..5 {
            let req = test::TestRequest::post()
                .uri("/api/auth/login")
                .set_json(login_body("wrong password!"))
                .to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

            let body: ErrorBody = test::read_body_json(resp).await;
            assert_eq!(body.error, "Invalid email or password");
        }

        // The right password no longer helps.
        let req = test::TestRequest::post()
            .uri("/api/auth/login")
            .set_json(login_body("correct horse battery"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        let body: ErrorBody = test::read_body_json(resp).await;
        assert_eq!(body.error, "Account is locked");

        let events = audit.events().await;
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, SecurityEventKind::AccountLocked);
    }

    #[actix_web::test]
    async fn refresh_mints_a_working_access_token() {
        let state = test_state(Arc::new(InMemoryAudit::new()));
        let app = test_app!(state);

        let req = test::TestRequest::post()
            .uri("/api/auth/register")
            .set_json(register_body())
            .to_request();
        let auth: AuthResponse = test::read_body_json(test::call_service(&app, req).await).await;

        let req = test::TestRequest::post()
            .uri("/api/auth/refresh")
            .set_json(serde_json::json!({ "refreshToken": auth.refresh_token }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let refreshed: RefreshResponse = test::read_body_json(resp).await;
        let req = test::TestRequest::get()
            .uri("/api/auth/me")
            .insert_header((
                header::AUTHORIZATION,
                format!("Bearer {}", refreshed.access_token),
            ))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

        // Garbage refresh tokens are rejected.
        let req = test::TestRequest::post()
            .uri("/api/auth/refresh")
            .set_json(serde_json::json!({ "refreshToken": "nonsense" }))
            .to_request();
        assert_eq!(
            test::call_service(&app, req).await.status(),
            StatusCode::UNAUTHORIZED
        );
    }

    #[actix_web::test]
    async fn logout_revokes_both_tokens() {
        let state = test_state(Arc::new(InMemoryAudit::new()));
        let app = test_app!(state);

        let req = test::TestRequest::post()
            .uri("/api/auth/register")
            .set_json(register_body())
            .to_request();
        let auth: AuthResponse = test::read_body_json(test::call_service(&app, req).await).await;

        let req = test::TestRequest::post()
            .uri("/api/auth/logout")
            .insert_header((header::AUTHORIZATION, format!("Bearer {}", auth.access_token)))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

        // The access token is now revoked by jti.
        let req = test::TestRequest::get()
            .uri("/api/auth/me")
            .insert_header((header::AUTHORIZATION, format!("Bearer {}", auth.access_token)))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        let body: ErrorBody = test::read_body_json(resp).await;
        assert_eq!(body.error, "Token has been revoked");

        // And so is the refresh token.
        let req = test::TestRequest::post()
            .uri("/api/auth/refresh")
            .set_json(serde_json::json!({ "refreshToken": auth.refresh_token }))
            .to_request();
        assert_eq!(
            test::call_service(&app, req).await.status(),
            StatusCode::UNAUTHORIZED
        );
    }
}
