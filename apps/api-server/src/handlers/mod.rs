//! HTTP handlers and route configuration.

mod auth;
mod health;
mod items;

use std::sync::Arc;

use actix_web::web;

use bazaar_core::ports::RateLimiter;

use crate::middleware::rate_limit::RateLimitMiddleware;

/// Configure all application routes. The credential-accepting auth routes
/// sit behind the keyed rate limiter; everything guarded is enforced by the
/// auth middleware wrapped around the whole app.
pub fn configure_routes(
    limiter: Arc<dyn RateLimiter>,
) -> impl FnOnce(&mut web::ServiceConfig) {
    move |cfg| {
        cfg.service(
            web::scope("/api")
                .route("/health", web::get().to(health::health_check))
                .service(
                    web::scope("/auth")
                        .service(
                            web::resource("/register")
                                .wrap(RateLimitMiddleware::new(limiter.clone()))
                                .route(web::post().to(auth::register)),
                        )
                        .service(
                            web::resource("/login")
                                .wrap(RateLimitMiddleware::new(limiter.clone()))
                                .route(web::post().to(auth::login)),
                        )
                        .service(
                            web::resource("/refresh")
                                .wrap(RateLimitMiddleware::new(limiter))
                                .route(web::post().to(auth::refresh)),
                        )
                        .route("/logout", web::post().to(auth::logout))
                        .route("/me", web::get().to(auth::me)),
                )
                .service(
                    web::scope("/cart")
                        .route("", web::get().to(items::get_cart))
                        .route("", web::post().to(items::add_to_cart))
                        .route("", web::put().to(items::update_cart))
                        .route("", web::delete().to(items::remove_from_cart))
                        .route("/clear", web::post().to(items::clear_cart)),
                )
                .service(
                    web::scope("/wishlist")
                        .route("", web::get().to(items::get_wishlist))
                        .route("", web::post().to(items::add_to_wishlist))
                        .route("", web::delete().to(items::remove_from_wishlist)),
                ),
        );
    }
}
