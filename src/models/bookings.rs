use chrono::{DateTime, NaiveDate, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize)]
pub struct Booking {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub user_id: ObjectId,
    pub accommodation_id: ObjectId,
    pub check_in: NaiveDate,
    /// Exclusive: the Monday after the last selected week.
    pub check_out: NaiveDate,
    pub total_price: i64,
    pub status: String,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Payload the client submits once a range and accommodation are chosen.
/// The server recomputes the total; the client's figure must match.
#[derive(Debug, Deserialize, Serialize)]
pub struct BookingRequest {
    pub accommodation_id: String,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub total_price: i64,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
pub enum AvailabilityStatus {
    #[serde(rename = "BOOKED")]
    Booked,
    #[serde(rename = "HOLD")]
    Hold,
}

/// One night of one accommodation. A unique index on
/// (accommodation_id, date) is the collaborator-side guard against two
/// identical submissions racing each other.
#[derive(Debug, Deserialize, Serialize)]
pub struct AvailabilityRecord {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub accommodation_id: ObjectId,
    pub date: NaiveDate,
    pub status: AvailabilityStatus,
}

/// Booking joined with its accommodation summary for the "my bookings" list.
#[derive(Debug, Serialize)]
pub struct BookingWithAccommodation {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub total_price: i64,
    pub status: String,
    pub accommodation: Option<AccommodationSummary>,
}

#[derive(Debug, Serialize, Clone)]
pub struct AccommodationSummary {
    pub title: String,
    pub price: f64,
    pub image_url: String,
}
