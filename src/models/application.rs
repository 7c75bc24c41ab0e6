use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ApplicationStatus {
    Pending,
    Approved,
    Rejected,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ApplicationAnswer {
    pub question: String,
    pub answer: String,
}

/// A prospective guest's vetting questionnaire. One pending application per
/// user at a time.
#[derive(Debug, Deserialize, Serialize)]
pub struct GuestApplication {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub user_id: ObjectId,
    pub answers: Vec<ApplicationAnswer>,
    pub status: ApplicationStatus,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct ApplicationInput {
    pub answers: Vec<ApplicationAnswer>,
}

#[derive(Debug, Deserialize)]
pub struct ApplicationReview {
    pub status: ApplicationStatus,
}
