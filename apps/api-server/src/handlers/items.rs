//! Cart and wishlist handlers.
//!
//! POST is the idempotent add: re-sending an existing cart line increments
//! its quantity, re-sending a wishlist line changes nothing. This is the
//! server-side half of the guest-list merge contract.

use actix_web::{HttpResponse, web};

use bazaar_core::domain::{Item, ItemKey, ListKind};
use bazaar_core::error::RepoError;
use bazaar_core::ports::ItemStore;
use bazaar_shared::ItemsEnvelope;
use bazaar_shared::dto::ItemPayload;

use crate::middleware::auth::CurrentUser;
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

fn to_item(payload: ItemPayload, kind: ListKind) -> Result<Item, AppError> {
    if payload.product_id.is_empty() {
        return Err(AppError::BadRequest("Product id is required".to_string()));
    }
    let quantity = match kind {
        ListKind::Cart => payload.quantity.unwrap_or(1),
        ListKind::Wishlist => 1,
    };
    if quantity == 0 {
        return Err(AppError::BadRequest(
            "Quantity must be at least 1".to_string(),
        ));
    }
    Ok(Item::new(payload.product_id, quantity, payload.variant))
}

fn to_key(payload: &ItemPayload) -> ItemKey {
    ItemKey {
        product_id: payload.product_id.clone(),
        variant: payload.variant.clone(),
    }
}

fn envelope(items: Vec<Item>, kind: ListKind) -> ItemsEnvelope {
    let payloads = items
        .into_iter()
        .map(|item| ItemPayload {
            quantity: (kind == ListKind::Cart).then_some(item.quantity),
            product_id: item.product_id,
            variant: item.variant,
        })
        .collect();
    ItemsEnvelope::ok(payloads)
}

async fn list(store: &dyn ItemStore, user: &CurrentUser) -> AppResult<HttpResponse> {
    let items = store.list(user.0.id).await?;
    Ok(HttpResponse::Ok().json(envelope(items, store.kind())))
}

async fn add(
    store: &dyn ItemStore,
    user: &CurrentUser,
    payload: ItemPayload,
) -> AppResult<HttpResponse> {
    let item = to_item(payload, store.kind())?;
    let items = store.add(user.0.id, item).await?;
    Ok(HttpResponse::Ok().json(envelope(items, store.kind())))
}

async fn remove(
    store: &dyn ItemStore,
    user: &CurrentUser,
    payload: &ItemPayload,
) -> AppResult<HttpResponse> {
    let items = store.remove(user.0.id, &to_key(payload)).await?;
    Ok(HttpResponse::Ok().json(envelope(items, store.kind())))
}

/// GET /api/cart
pub async fn get_cart(state: web::Data<AppState>, user: CurrentUser) -> AppResult<HttpResponse> {
    list(state.cart.as_ref(), &user).await
}

/// POST /api/cart
pub async fn add_to_cart(
    state: web::Data<AppState>,
    user: CurrentUser,
    body: web::Json<ItemPayload>,
) -> AppResult<HttpResponse> {
    add(state.cart.as_ref(), &user, body.into_inner()).await
}

/// PUT /api/cart - set a line's quantity; zero removes it.
pub async fn update_cart(
    state: web::Data<AppState>,
    user: CurrentUser,
    body: web::Json<ItemPayload>,
) -> AppResult<HttpResponse> {
    let payload = body.into_inner();
    let quantity = payload
        .quantity
        .ok_or_else(|| AppError::BadRequest("Quantity is required".to_string()))?;

    match state
        .cart
        .set_quantity(user.0.id, &to_key(&payload), quantity)
        .await
    {
        Ok(items) => Ok(HttpResponse::Ok().json(envelope(items, ListKind::Cart))),
        Err(RepoError::NotFound) => {
            Ok(HttpResponse::NotFound().json(ItemsEnvelope::fail("Item not found in cart")))
        }
        Err(other) => Err(other.into()),
    }
}

/// DELETE /api/cart
pub async fn remove_from_cart(
    state: web::Data<AppState>,
    user: CurrentUser,
    body: web::Json<ItemPayload>,
) -> AppResult<HttpResponse> {
    remove(state.cart.as_ref(), &user, &body.into_inner()).await
}

/// POST /api/cart/clear
pub async fn clear_cart(state: web::Data<AppState>, user: CurrentUser) -> AppResult<HttpResponse> {
    state.cart.clear(user.0.id).await?;
    Ok(HttpResponse::Ok().json(ItemsEnvelope::ok(Vec::new())))
}

/// GET /api/wishlist
pub async fn get_wishlist(
    state: web::Data<AppState>,
    user: CurrentUser,
) -> AppResult<HttpResponse> {
    list(state.wishlist.as_ref(), &user).await
}

/// POST /api/wishlist
pub async fn add_to_wishlist(
    state: web::Data<AppState>,
    user: CurrentUser,
    body: web::Json<ItemPayload>,
) -> AppResult<HttpResponse> {
    add(state.wishlist.as_ref(), &user, body.into_inner()).await
}

/// DELETE /api/wishlist
pub async fn remove_from_wishlist(
    state: web::Data<AppState>,
    user: CurrentUser,
    body: web::Json<ItemPayload>,
) -> AppResult<HttpResponse> {
    remove(state.wishlist.as_ref(), &user, &body.into_inner()).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use actix_web::{App, http::StatusCode, http::header, test};

    use bazaar_core::domain::{Role, User};
    use bazaar_core::ports::RateLimiter;
    use bazaar_core::rbac::RbacPolicy;
    use bazaar_infra::audit::InMemoryAudit;
    use bazaar_infra::auth::{Argon2PasswordService, HsTokenService, JwtConfig};
    use bazaar_infra::rate_limit::{KeyedRateLimiter, RateLimitConfig};
    use bazaar_infra::revocation::InMemoryRevocationStore;
    use bazaar_infra::store::{InMemoryItemStore, InMemoryRefreshTokenStore, InMemoryUserStore};

    use crate::config::SecuritySettings;
    use crate::handlers::configure_routes;
    use crate::middleware::auth::AuthMiddleware;

    fn test_state() -> AppState {
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
            audit: Arc::new(InMemoryAudit::new()),
            policy: Arc::new(RbacPolicy::new()),
            security: SecuritySettings::default(),
        }
    }

    async fn customer_token(state: &AppState) -> String {
        let user = state
            .users
            .save(User::new(
                "shopper@example.com".to_string(),
                "Shopper".to_string(),
                "irrelevant-hash".to_string(),
                Role::Customer,
            ))
            .await
            .unwrap();
        state.tokens.issue_access_token(&user.principal()).unwrap()
    }

    macro_rules! test_app {
        ($state:expr) => {{
            let limiter: Arc<dyn RateLimiter> =
                Arc::new(KeyedRateLimiter::new(RateLimitConfig::default()));
            test::init_service(
                App::new()
                    .wrap(AuthMiddleware::new($state.clone()))
                    .app_data(web::Data::new($state.clone()))
                    .configure(configure_routes(limiter)),
            )
            .await
        }};
    }

    fn bearer(token: &str) -> (header::HeaderName, String) {
        (header::AUTHORIZATION, format!("Bearer {token}"))
    }

    #[actix_web::test]
    async fn cart_add_is_idempotent_on_the_identity_key() {
        let state = test_state();
        let app = test_app!(state);
        let token = customer_token(&state).await;

        for quantity in [2u32, 3] {
            let req = test::TestRequest::post()
                .uri("/api/cart")
                .insert_header(bearer(&token))
                .set_json(serde_json::json!({ "productId": "p1", "quantity": quantity }))
                .to_request();
            assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);
        }

        let req = test::TestRequest::get()
            .uri("/api/cart")
            .insert_header(bearer(&token))
            .to_request();
        let envelope: ItemsEnvelope = test::read_body_json(test::call_service(&app, req).await).await;

        assert!(envelope.success);
        let items = envelope.items.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].product_id, "p1");
        assert_eq!(items[0].quantity, Some(5));
    }

    #[actix_web::test]
    async fn cart_variants_are_separate_lines() {
        let state = test_state();
        let app = test_app!(state);
        let token = customer_token(&state).await;

        for variant in [serde_json::Value::Null, serde_json::json!("red")] {
            let req = test::TestRequest::post()
                .uri("/api/cart")
                .insert_header(bearer(&token))
                .set_json(serde_json::json!({ "productId": "p1", "variant": variant }))
                .to_request();
            test::call_service(&app, req).await;
        }

        let req = test::TestRequest::get()
            .uri("/api/cart")
            .insert_header(bearer(&token))
            .to_request();
        let envelope: ItemsEnvelope = test::read_body_json(test::call_service(&app, req).await).await;
        assert_eq!(envelope.items.unwrap().len(), 2);
    }

    #[actix_web::test]
    async fn cart_update_and_remove() {
        let state = test_state();
        let app = test_app!(state);
        let token = customer_token(&state).await;

        let req = test::TestRequest::post()
            .uri("/api/cart")
            .insert_header(bearer(&token))
            .set_json(serde_json::json!({ "productId": "p1", "quantity": 2 }))
            .to_request();
        test::call_service(&app, req).await;

        let req = test::TestRequest::put()
            .uri("/api/cart")
            .insert_header(bearer(&token))
            .set_json(serde_json::json!({ "productId": "p1", "quantity": 7 }))
            .to_request();
        let envelope: ItemsEnvelope = test::read_body_json(test::call_service(&app, req).await).await;
        assert_eq!(envelope.items.unwrap()[0].quantity, Some(7));

        // Quantity zero removes the line.
        let req = test::TestRequest::put()
            .uri("/api/cart")
            .insert_header(bearer(&token))
            .set_json(serde_json::json!({ "productId": "p1", "quantity": 0 }))
            .to_request();
        let envelope: ItemsEnvelope = test::read_body_json(test::call_service(&app, req).await).await;
        assert!(envelope.items.unwrap().is_empty());

        // Updating a missing line fails in-envelope.
        let req = test::TestRequest::put()
            .uri("/api/cart")
            .insert_header(bearer(&token))
            .set_json(serde_json::json!({ "productId": "p1", "quantity": 1 }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let envelope: ItemsEnvelope = test::read_body_json(resp).await;
        assert!(!envelope.success);
        assert_eq!(envelope.error.as_deref(), Some("Item not found in cart"));
    }

    #[actix_web::test]
    async fn wishlist_add_is_presence_only() {
        let state = test_state();
        let app = test_app!(state);
        let token = customer_token(&state).await;

        for _ in 0..2 {
            let req = test::TestRequest::post()
                .uri("/api/wishlist")
                .insert_header(bearer(&token))
                .set_json(serde_json::json!({ "productId": "p9" }))
                .to_request();
            assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);
        }

        let req = test::TestRequest::get()
            .uri("/api/wishlist")
            .insert_header(bearer(&token))
            .to_request();
        let envelope: ItemsEnvelope = test::read_body_json(test::call_service(&app, req).await).await;

        let items = envelope.items.unwrap();
        assert_eq!(items.len(), 1);
        // Wishlist lines carry no quantity on the wire.
        assert_eq!(items[0].quantity, None);
    }

    #[actix_web::test]
    async fn clear_cart_empties_the_list() {
        let state = test_state();
        let app = test_app!(state);
        let token = customer_token(&state).await;

        let req = test::TestRequest::post()
            .uri("/api/cart")
            .insert_header(bearer(&token))
            .set_json(serde_json::json!({ "productId": "p1" }))
            .to_request();
        test::call_service(&app, req).await;

        let req = test::TestRequest::post()
            .uri("/api/cart/clear")
            .insert_header(bearer(&token))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

        let req = test::TestRequest::get()
            .uri("/api/cart")
            .insert_header(bearer(&token))
            .to_request();
        let envelope: ItemsEnvelope = test::read_body_json(test::call_service(&app, req).await).await;
        assert!(envelope.items.unwrap().is_empty());
    }

    #[actix_web::test]
    async fn zero_quantity_add_is_rejected() {
        let state = test_state();
        let app = test_app!(state);
        let token = customer_token(&state).await;

        let req = test::TestRequest::post()
            .uri("/api/cart")
            .insert_header(bearer(&token))
            .set_json(serde_json::json!({ "productId": "p1", "quantity": 0 }))
            .to_request();
        assert_eq!(
            test::call_service(&app, req).await.status(),
            StatusCode::BAD_REQUEST
        );
    }
}
