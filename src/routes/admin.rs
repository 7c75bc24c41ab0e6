use actix_web::web;

use crate::middleware::auth::AuthMiddleware;
use crate::middleware::role_auth::RequireRole;
use crate::models::account::UserRole;
use crate::routes::{application, scheduling};

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        // The wrap registered last runs first: authenticate, then check the role.
        web::scope("/admin")
            .wrap(RequireRole::new(UserRole::Admin))
            .wrap(AuthMiddleware)
            .route(
                "/scheduling-rules",
                web::post().to(scheduling::create_rule),
            )
            .route(
                "/scheduling-rules/{id}",
                web::put().to(scheduling::update_rule),
            )
            .route(
                "/scheduling-rules/{id}",
                web::delete().to(scheduling::delete_rule),
            )
            .route(
                "/applications",
                web::get().to(application::list_applications),
            )
            .route(
                "/applications/{id}",
                web::put().to(application::review_application),
            ),
    );
}
