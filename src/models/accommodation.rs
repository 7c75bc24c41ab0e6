use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Accommodation {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub title: String,
    /// Weekly rate on top of the venue base rate.
    pub price: f64,
    pub image_url: String,
}

/// List entry returned to the client, with the card-preview pricing for the
/// caller's selected weeks filled in when a range was supplied.
#[derive(Debug, Serialize)]
pub struct AccommodationPreview {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub title: String,
    pub price: f64,
    pub image_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discounted_price: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub discount: Option<f64>,
}
