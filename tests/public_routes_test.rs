mod common;

use actix_web::{test, web, App};
use serial_test::serial;

use garden_api::middleware::auth::AuthMiddleware;
use garden_api::routes;
use garden_api::services::availability_service::AvailabilityCache;

use common::detached_client;

// These tests stop at input validation or the auth gate, so the detached
// client is never asked to talk to a real database.

#[actix_rt::test]
#[serial]
async fn availability_requires_a_date_range() {
    let client = detached_client().await;
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(client))
            .app_data(web::Data::new(AvailabilityCache::new()))
            .route(
                "/api/accommodations/availability",
                web::get().to(routes::accommodation::get_availability),
            ),
    )
    .await;

    let req = test::TestRequest::get()
        .uri("/api/accommodations/availability")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);
}

#[actix_rt::test]
#[serial]
async fn availability_rejects_inverted_range() {
    let client = detached_client().await;
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(client))
            .app_data(web::Data::new(AvailabilityCache::new()))
            .route(
                "/api/accommodations/availability",
                web::get().to(routes::accommodation::get_availability),
            ),
    )
    .await;

    let req = test::TestRequest::get()
        .uri("/api/accommodations/availability?check_in=2024-05-20&check_out=2024-04-22")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);
}

#[actix_rt::test]
#[serial]
async fn availability_rejects_non_week_ranges() {
    let client = detached_client().await;
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(client))
            .app_data(web::Data::new(AvailabilityCache::new()))
            .route(
                "/api/accommodations/availability",
                web::get().to(routes::accommodation::get_availability),
            ),
    )
    .await;

    // Tuesday check-in: not a stay range, so nothing is queried or cached.
    let req = test::TestRequest::get()
        .uri("/api/accommodations/availability?check_in=2024-04-23&check_out=2024-04-30")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);

    // A fourteen-week span is past the stay limit.
    let req = test::TestRequest::get()
        .uri("/api/accommodations/availability?check_in=2024-01-01&check_out=2024-04-08")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);
}

#[actix_rt::test]
#[serial]
async fn accommodations_reject_misaligned_week_bounds() {
    let client = detached_client().await;
    let app = test::init_service(
        App::new().app_data(web::Data::new(client)).route(
            "/api/accommodations",
            web::get().to(routes::accommodation::get_accommodations),
        ),
    )
    .await;

    // Tuesday check-in; weeks start on Monday.
    let req = test::TestRequest::get()
        .uri("/api/accommodations?check_in=2024-04-23&check_out=2024-04-30")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);
}

#[actix_rt::test]
#[serial]
async fn bookings_require_authentication() {
    let client = detached_client().await;
    let app = test::init_service(
        App::new().app_data(web::Data::new(client)).service(
            web::scope("/api")
                .wrap(AuthMiddleware)
                .route("/bookings", web::post().to(routes::bookings::create_booking))
                .route(
                    "/bookings",
                    web::get().to(routes::bookings::get_user_bookings),
                ),
        ),
    )
    .await;

    let req = test::TestRequest::get().uri("/api/bookings").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 401);

    let req = test::TestRequest::post()
        .uri("/api/bookings")
        .set_json(serde_json::json!({
            "accommodation_id": "663bcd2f9f1b2c0007a1b2c3",
            "check_in": "2024-04-22",
            "check_out": "2024-05-20",
            "total_price": 1400
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 401);
}
