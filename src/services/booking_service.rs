use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use chrono::{NaiveDate, Utc};
use futures::TryStreamExt;
use mongodb::bson::{doc, oid::ObjectId};
use mongodb::{Client, Collection};
use serde_json::json;
use thiserror::Error;

use crate::db::mongo::{
    ACCOMMODATIONS, AVAILABILITY, BOOKINGS, CREDITS, GARDEN_DB, SCHEDULING_RULES, USERS,
};
use crate::models::accommodation::Accommodation;
use crate::models::account::{CreditTransaction, User};
use crate::models::bookings::{AvailabilityRecord, AvailabilityStatus, Booking, BookingRequest};
use crate::models::scheduling::SchedulingRule;
use crate::services::pricing_service::PricingService;
use crate::services::scheduling_service::SchedulingService;
use crate::services::week_selection::{SelectedRange, SelectionError};

/// Venue-wide weekly rate charged on top of the accommodation rate.
pub const BASE_RATE: f64 = 245.0;

#[derive(Debug, Error)]
pub enum BookingError {
    #[error(transparent)]
    Range(#[from] SelectionError),
    #[error("accommodation not found")]
    AccommodationNotFound,
    #[error("selected dates include blocked days")]
    DatesBlocked,
    #[error("total price does not match the selected weeks")]
    PriceMismatch,
    #[error("selected dates are not available")]
    AvailabilityConflict,
    #[error("insufficient credits")]
    InsufficientCredits,
    #[error("database error: {0}")]
    Database(#[from] mongodb::error::Error),
}

impl ResponseError for BookingError {
    fn status_code(&self) -> StatusCode {
        match self {
            BookingError::Range(_) | BookingError::DatesBlocked | BookingError::PriceMismatch => {
                StatusCode::BAD_REQUEST
            }
            BookingError::AccommodationNotFound => StatusCode::NOT_FOUND,
            BookingError::AvailabilityConflict => StatusCode::CONFLICT,
            BookingError::InsufficientCredits => StatusCode::PAYMENT_REQUIRED,
            // Retryable from the client's point of view.
            BookingError::Database(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(json!({ "error": self.to_string() }))
    }
}

pub struct BookingService;

impl BookingService {
    /// Run the whole booking pipeline: validate the week range, recompute
    /// the total, hold the nights, charge the credits, record the booking
    /// and its ledger row, then promote the holds to BOOKED. Every failure
    /// before the booking insert releases whatever was taken so the caller
    /// can retry with their selection intact.
    pub async fn create_booking(
        client: &Client,
        user_id: ObjectId,
        request: &BookingRequest,
    ) -> Result<Booking, BookingError> {
        let db = client.database(GARDEN_DB);

        let accommodation_id = ObjectId::parse_str(&request.accommodation_id)
            .map_err(|_| BookingError::AccommodationNotFound)?;
        let accommodations: Collection<Accommodation> = db.collection(ACCOMMODATIONS);
        let accommodation = accommodations
            .find_one(doc! { "_id": accommodation_id })
            .await?
            .ok_or(BookingError::AccommodationNotFound)?;

        let range = SelectedRange::from_bounds(request.check_in, request.check_out)?;

        let rules_coll: Collection<SchedulingRule> = db.collection(SCHEDULING_RULES);
        let rules: Vec<SchedulingRule> = rules_coll.find(doc! {}).await?.try_collect().await?;
        Self::check_dates_open(&rules, &range)?;

        let total =
            Self::verify_total(&range, BASE_RATE, accommodation.price, request.total_price)?;

        let availability: Collection<AvailabilityRecord> = db.collection(AVAILABILITY);
        let conflict_filter = doc! {
            "accommodation_id": accommodation_id,
            "status": { "$in": ["BOOKED", "HOLD"] },
            "date": { "$gte": request.check_in.to_string(), "$lt": request.check_out.to_string() },
        };
        if availability.find_one(conflict_filter).await?.is_some() {
            return Err(BookingError::AvailabilityConflict);
        }

        // Take a HOLD on every night. The unique (accommodation_id, date)
        // index makes the first writer win; a duplicate key means someone
        // else booked between the check above and here.
        let nights: Vec<NaiveDate> = range.weeks().iter().flat_map(|w| w.nights()).collect();
        let mut held: Vec<NaiveDate> = Vec::with_capacity(nights.len());
        for night in &nights {
            let record = AvailabilityRecord {
                id: None,
                accommodation_id,
                date: *night,
                status: AvailabilityStatus::Hold,
            };
            match availability.insert_one(&record).await {
                Ok(_) => held.push(*night),
                Err(err) => {
                    Self::release_nights(&availability, accommodation_id, &held).await;
                    if is_duplicate_key(&err) {
                        return Err(BookingError::AvailabilityConflict);
                    }
                    return Err(err.into());
                }
            }
        }

        // Charge the credits with the balance guard in the filter; no match
        // means the balance fell short.
        let users: Collection<User> = db.collection(USERS);
        let charged = users
            .find_one_and_update(
                doc! { "_id": user_id, "credits": { "$gte": total } },
                doc! {
                    "$inc": { "credits": -total },
                    "$set": { "updated_at": Utc::now().to_rfc3339() },
                },
            )
            .await;
        match charged {
            Ok(Some(_)) => {}
            Ok(None) => {
                Self::release_nights(&availability, accommodation_id, &held).await;
                return Err(BookingError::InsufficientCredits);
            }
            Err(err) => {
                Self::release_nights(&availability, accommodation_id, &held).await;
                return Err(err.into());
            }
        }

        let time = Utc::now();
        let mut booking = Booking {
            id: None,
            user_id,
            accommodation_id,
            check_in: request.check_in,
            check_out: request.check_out,
            total_price: total,
            status: "confirmed".to_string(),
            created_at: Some(time),
            updated_at: Some(time),
        };

        let bookings: Collection<Booking> = db.collection(BOOKINGS);
        let inserted = match bookings.insert_one(&booking).await {
            Ok(result) => result,
            Err(err) => {
                Self::refund(&users, user_id, total).await;
                Self::release_nights(&availability, accommodation_id, &held).await;
                return Err(err.into());
            }
        };
        booking.id = inserted.inserted_id.as_object_id();

        let credits: Collection<CreditTransaction> = db.collection(CREDITS);
        let transaction = CreditTransaction {
            id: None,
            user_id,
            amount: -total,
            description: format!("Booking for {}", accommodation.title),
            booking_id: booking.id,
            created_at: Some(time),
        };
        if let Err(err) = credits.insert_one(&transaction).await {
            // The booking stands; the ledger catches up on the next audit.
            log::error!(
                "Booking {:?} created but ledger write failed: {}",
                booking.id,
                err
            );
        }

        let promote_filter = doc! {
            "accommodation_id": accommodation_id,
            "status": "HOLD",
            "date": { "$gte": request.check_in.to_string(), "$lt": request.check_out.to_string() },
        };
        if let Err(err) = availability
            .update_many(promote_filter, doc! { "$set": { "status": "BOOKED" } })
            .await
        {
            log::error!("Failed to promote held nights to BOOKED: {}", err);
        }

        Ok(booking)
    }

    /// Reject a range with any night the scheduling rules close off.
    fn check_dates_open(rules: &[SchedulingRule], range: &SelectedRange) -> Result<(), BookingError> {
        let blocked = range
            .weeks()
            .iter()
            .flat_map(|w| w.nights())
            .any(|night| SchedulingService::is_date_blocked(rules, night));
        if blocked {
            return Err(BookingError::DatesBlocked);
        }
        Ok(())
    }

    /// Recompute what the selected weeks cost and hold the caller to it.
    /// The charged amount is always the server's figure, never the client's.
    fn verify_total(
        range: &SelectedRange,
        base_rate: f64,
        accommodation_rate: f64,
        claimed: i64,
    ) -> Result<i64, BookingError> {
        // from_bounds rejects empty ranges, so a total always exists.
        let total = PricingService::total_price(range, base_rate, accommodation_rate)
            .ok_or(SelectionError::MisalignedBounds)?;
        if total != claimed {
            return Err(BookingError::PriceMismatch);
        }
        Ok(total)
    }

    async fn release_nights(
        availability: &Collection<AvailabilityRecord>,
        accommodation_id: ObjectId,
        nights: &[NaiveDate],
    ) {
        if nights.is_empty() {
            return;
        }
        let dates: Vec<String> = nights.iter().map(|d| d.to_string()).collect();
        let filter = doc! {
            "accommodation_id": accommodation_id,
            "status": "HOLD",
            "date": { "$in": dates },
        };
        if let Err(err) = availability.delete_many(filter).await {
            log::error!("Failed to release held nights: {}", err);
        }
    }

    async fn refund(users: &Collection<User>, user_id: ObjectId, amount: i64) {
        let result = users
            .update_one(
                doc! { "_id": user_id },
                doc! { "$inc": { "credits": amount } },
            )
            .await;
        if let Err(err) = result {
            log::error!("Failed to refund {} credits to {}: {}", amount, user_id, err);
        }
    }
}

fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
    if let mongodb::error::ErrorKind::Write(mongodb::error::WriteFailure::WriteError(write_err)) =
        &*err.kind
    {
        return write_err.code == 11000;
    }
    false
}
