use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use env_logger::Env;

use garden_api::db;
use garden_api::middleware::auth::AuthMiddleware;
use garden_api::routes;
use garden_api::services::availability_service::AvailabilityCache;
use garden_api::services::change_feed::ChangeFeed;

const HOST: &str = "0.0.0.0";
const PORT: u16 = 8080;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init_from_env(Env::default().default_filter_or("info"));

    if cfg!(debug_assertions) {
        dotenv::dotenv().ok();
    }

    let host = std::env::var("HOST").unwrap_or_else(|_| HOST.to_string());
    let port: u16 = std::env::var("PORT")
        .unwrap_or_else(|_| PORT.to_string())
        .parse()
        .unwrap_or(PORT);

    let mongo_uri = std::env::var("MONGODB_URI").expect("MONGODB_URI must be set");
    let client = db::mongo::create_mongo_client(&mongo_uri).await;
    if let Err(err) = db::mongo::ensure_indexes(&client).await {
        log::warn!("Failed to ensure indexes: {}", err);
    }

    let cache = web::Data::new(AvailabilityCache::new());

    // Push-based invalidation: any change to these collections drops the
    // cached availability; clients re-fetch on their next request.
    let feed = ChangeFeed::new();
    feed.watch(client.clone(), db::mongo::ACCOMMODATIONS);
    feed.watch(client.clone(), db::mongo::SCHEDULING_RULES);
    feed.watch(client.clone(), db::mongo::AVAILABILITY);
    {
        let mut rx = feed.subscribe();
        let cache = cache.clone();
        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(signal) => {
                        log::debug!("Change in {}, invalidating availability", signal.collection);
                        cache.invalidate();
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Lagged(_)) => {
                        cache.invalidate();
                    }
                    Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
                }
            }
        });
    }

    log::info!("Starting HTTP server on {}:{}", host, port);

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allow_any_method()
                    .allow_any_header()
                    .max_age(3600),
            )
            .app_data(web::Data::new(client.clone()))
            .app_data(cache.clone())
            .route("/health", web::get().to(routes::health::health_check))
            .service(
                web::scope("/api")
                    .service(
                        web::scope("/auth")
                            .route("/signup", web::post().to(routes::auth::signup))
                            .route("/signin", web::post().to(routes::auth::signin))
                            .service(
                                web::scope("")
                                    .wrap(AuthMiddleware)
                                    .route("/session", web::get().to(routes::auth::user_session)),
                            ),
                    )
                    .route(
                        "/accommodations",
                        web::get().to(routes::accommodation::get_accommodations),
                    )
                    .route(
                        "/accommodations/availability",
                        web::get().to(routes::accommodation::get_availability),
                    )
                    .route(
                        "/scheduling-rules",
                        web::get().to(routes::scheduling::list_rules),
                    )
                    .configure(routes::admin::config)
                    .service(
                        web::scope("")
                            .wrap(AuthMiddleware)
                            .route("/bookings", web::post().to(routes::bookings::create_booking))
                            .route(
                                "/bookings",
                                web::get().to(routes::bookings::get_user_bookings),
                            )
                            .route(
                                "/credits/balance",
                                web::get().to(routes::credits::get_balance),
                            )
                            .route(
                                "/credits/history",
                                web::get().to(routes::credits::get_history),
                            )
                            .route(
                                "/applications",
                                web::post().to(routes::application::submit_application),
                            ),
                    ),
            )
    })
    .bind((host, port))?
    .run()
    .await
}
