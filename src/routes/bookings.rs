use actix_web::{web, HttpResponse, Responder, ResponseError};
use futures::TryStreamExt;
use mongodb::bson::{doc, oid::ObjectId};
use mongodb::{Client, Collection};
use std::collections::HashMap;
use std::sync::Arc;

use crate::db::mongo::{ACCOMMODATIONS, BOOKINGS, GARDEN_DB};
use crate::middleware::auth::Claims;
use crate::models::accommodation::Accommodation;
use crate::models::bookings::{
    AccommodationSummary, Booking, BookingRequest, BookingWithAccommodation,
};
use crate::services::booking_service::BookingService;

pub async fn create_booking(
    data: web::Data<Arc<Client>>,
    input: web::Json<BookingRequest>,
    claims: Claims,
) -> impl Responder {
    let client = data.into_inner();

    let user_id = match ObjectId::parse_str(&claims.user_id) {
        Ok(id) => id,
        Err(_) => return HttpResponse::BadRequest().body("Invalid user ID"),
    };

    match BookingService::create_booking(&client, user_id, &input.into_inner()).await {
        Ok(booking) => HttpResponse::Ok().json(booking),
        Err(err) => {
            log::info!("Booking rejected for {}: {}", claims.sub, err);
            err.error_response()
        }
    }
}

/// The caller's bookings, check-in ascending, each joined with its
/// accommodation summary.
pub async fn get_user_bookings(data: web::Data<Arc<Client>>, claims: Claims) -> impl Responder {
    let client = data.into_inner();
    let collection: Collection<Booking> = client.database(GARDEN_DB).collection(BOOKINGS);

    let user_id = match ObjectId::parse_str(&claims.user_id) {
        Ok(id) => id,
        Err(_) => return HttpResponse::BadRequest().body("Invalid user ID"),
    };

    let bookings: Vec<Booking> = match collection
        .find(doc! { "user_id": user_id })
        .sort(doc! { "check_in": 1 })
        .await
    {
        Ok(cursor) => match cursor.try_collect().await {
            Ok(bookings) => bookings,
            Err(err) => {
                log::error!("Error retrieving bookings: {:?}", err);
                return HttpResponse::InternalServerError().body("Failed to retrieve bookings");
            }
        },
        Err(err) => {
            log::error!("Error fetching bookings: {:?}", err);
            return HttpResponse::InternalServerError().body("Failed to fetch bookings");
        }
    };

    let accommodation_ids: Vec<ObjectId> =
        bookings.iter().map(|b| b.accommodation_id).collect();
    let accommodations: Collection<Accommodation> =
        client.database(GARDEN_DB).collection(ACCOMMODATIONS);
    let summaries: HashMap<ObjectId, AccommodationSummary> = match accommodations
        .find(doc! { "_id": { "$in": accommodation_ids } })
        .await
    {
        Ok(cursor) => match cursor.try_collect::<Vec<Accommodation>>().await {
            Ok(list) => list
                .into_iter()
                .filter_map(|acc| {
                    acc.id.map(|id| {
                        (
                            id,
                            AccommodationSummary {
                                title: acc.title,
                                price: acc.price,
                                image_url: acc.image_url,
                            },
                        )
                    })
                })
                .collect(),
            Err(err) => {
                log::error!("Error retrieving accommodations: {:?}", err);
                return HttpResponse::InternalServerError().body("Failed to retrieve bookings");
            }
        },
        Err(err) => {
            log::error!("Error fetching accommodations: {:?}", err);
            return HttpResponse::InternalServerError().body("Failed to fetch bookings");
        }
    };

    let joined: Vec<BookingWithAccommodation> = bookings
        .into_iter()
        .filter_map(|booking| {
            let id = booking.id?;
            Some(BookingWithAccommodation {
                id,
                check_in: booking.check_in,
                check_out: booking.check_out,
                total_price: booking.total_price,
                status: booking.status,
                accommodation: summaries.get(&booking.accommodation_id).cloned(),
            })
        })
        .collect();

    HttpResponse::Ok().json(joined)
}
