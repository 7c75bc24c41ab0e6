mod common;

use actix_web::{test, web, App, HttpResponse, Responder};
use serial_test::serial;

use garden_api::middleware::auth::AuthMiddleware;
use garden_api::middleware::role_auth::RequireRole;
use garden_api::models::account::UserRole;

use common::{bearer, set_test_secret};

async fn admin_ok() -> impl Responder {
    HttpResponse::Ok().body("admin area")
}

fn admin_scope() -> actix_web::Scope<
    impl actix_web::dev::ServiceFactory<
        actix_web::dev::ServiceRequest,
        Config = (),
        Response = actix_web::dev::ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    web::scope("/admin")
        .wrap(RequireRole::new(UserRole::Admin))
        .wrap(AuthMiddleware)
        .route("/ping", web::get().to(admin_ok))
}

#[actix_rt::test]
#[serial]
async fn admin_scope_without_auth_is_unauthorized() {
    set_test_secret();
    let app = test::init_service(App::new().service(admin_scope())).await;

    let req = test::TestRequest::get().uri("/admin/ping").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 401);
}

#[actix_rt::test]
#[serial]
async fn user_role_is_forbidden_from_admin_scope() {
    set_test_secret();
    let app = test::init_service(App::new().service(admin_scope())).await;

    let req = test::TestRequest::get()
        .uri("/admin/ping")
        .insert_header(("Authorization", bearer("guest@thegarden.pt", UserRole::User)))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 403);
}

#[actix_rt::test]
#[serial]
async fn admin_role_is_admitted() {
    set_test_secret();
    let app = test::init_service(App::new().service(admin_scope())).await;

    let req = test::TestRequest::get()
        .uri("/admin/ping")
        .insert_header(("Authorization", bearer("steward@thegarden.pt", UserRole::Admin)))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());

    let body = test::read_body(resp).await;
    assert_eq!(body, "admin area");
}
