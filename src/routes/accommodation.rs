use actix_web::{web, HttpResponse, Responder};
use chrono::NaiveDate;
use futures::TryStreamExt;
use mongodb::bson::doc;
use mongodb::{Client, Collection};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;

use crate::db::mongo::{ACCOMMODATIONS, GARDEN_DB};
use crate::models::accommodation::{Accommodation, AccommodationPreview};
use crate::services::availability_service::{AvailabilityCache, AvailabilityService};
use crate::services::pricing_service::PricingService;
use crate::services::week_selection::SelectedRange;

#[derive(Debug, Deserialize)]
pub struct StayQuery {
    pub check_in: Option<NaiveDate>,
    pub check_out: Option<NaiveDate>,
}

/// List accommodations sorted by price. When the caller passes their
/// selected range, each card carries the combined-discount preview price.
pub async fn get_accommodations(
    data: web::Data<Arc<Client>>,
    query: web::Query<StayQuery>,
) -> impl Responder {
    let client = data.into_inner();

    let range = match (query.check_in, query.check_out) {
        (Some(check_in), Some(check_out)) => {
            match SelectedRange::from_bounds(check_in, check_out) {
                Ok(range) => Some(range),
                Err(err) => return HttpResponse::BadRequest().body(err.to_string()),
            }
        }
        _ => None,
    };

    let accommodations = match load_accommodations(&client).await {
        Ok(list) => list,
        Err(err) => {
            log::error!("Error loading accommodations: {:?}", err);
            return HttpResponse::InternalServerError().body("Failed to fetch accommodations");
        }
    };

    let previews: Vec<AccommodationPreview> = accommodations
        .into_iter()
        .filter_map(|acc| {
            let id = acc.id?;
            Some(AccommodationPreview {
                id,
                title: acc.title,
                price: acc.price,
                image_url: acc.image_url,
                discounted_price: range
                    .as_ref()
                    .map(|r| PricingService::discounted_weekly_price(acc.price, r)),
                discount: range.as_ref().map(PricingService::combined_discount),
            })
        })
        .collect();

    HttpResponse::Ok().json(previews)
}

/// Per-accommodation availability over the requested range, served from the
/// invalidation-aware cache when possible.
pub async fn get_availability(
    data: web::Data<Arc<Client>>,
    cache: web::Data<AvailabilityCache>,
    query: web::Query<StayQuery>,
) -> impl Responder {
    let client = data.into_inner();

    // Availability is only ever asked about whole stay ranges; anything
    // else is rejected before it can touch the database or the cache.
    let (check_in, check_out) = match (query.check_in, query.check_out) {
        (Some(check_in), Some(check_out)) => {
            match SelectedRange::from_bounds(check_in, check_out) {
                Ok(_) => (check_in, check_out),
                Err(err) => return HttpResponse::BadRequest().body(err.to_string()),
            }
        }
        _ => return HttpResponse::BadRequest().body("check_in and check_out are required"),
    };

    let unavailable = match cache.get(check_in, check_out) {
        Some(cached) => cached,
        None => {
            let token = cache.begin();
            match AvailabilityService::unavailable_accommodations(&client, check_in, check_out)
                .await
            {
                Ok(fresh) => {
                    if !cache.store(token, check_in, check_out, fresh.clone()) {
                        log::debug!("Availability result outdated by an invalidation; not cached");
                    }
                    fresh
                }
                Err(err) => {
                    log::error!("Error checking availability: {:?}", err);
                    return HttpResponse::ServiceUnavailable().body("Failed to check availability");
                }
            }
        }
    };

    let accommodations = match load_accommodations(&client).await {
        Ok(list) => list,
        Err(err) => {
            log::error!("Error loading accommodations: {:?}", err);
            return HttpResponse::InternalServerError().body("Failed to fetch accommodations");
        }
    };

    let map: HashMap<String, bool> = accommodations
        .iter()
        .filter_map(|acc| {
            acc.id
                .map(|id| (id.to_hex(), !unavailable.contains(&id)))
        })
        .collect();

    HttpResponse::Ok().json(map)
}

async fn load_accommodations(client: &Client) -> mongodb::error::Result<Vec<Accommodation>> {
    let collection: Collection<Accommodation> =
        client.database(GARDEN_DB).collection(ACCOMMODATIONS);
    collection
        .find(doc! {})
        .sort(doc! { "price": 1 })
        .await?
        .try_collect()
        .await
}
