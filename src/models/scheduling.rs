use chrono::{DateTime, NaiveDate, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

/// Admin-managed rule covering a date interval. A blocked rule closes the
/// whole interval; otherwise the rule can pin arrival/departure weekdays or
/// block individual dates inside the interval.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SchedulingRule {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub arrival_day: Option<String>,
    pub departure_day: Option<String>,
    pub is_blocked: bool,
    #[serde(default)]
    pub blocked_dates: Vec<NaiveDate>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct SchedulingRuleInput {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub arrival_day: Option<String>,
    pub departure_day: Option<String>,
    #[serde(default)]
    pub is_blocked: bool,
    #[serde(default)]
    pub blocked_dates: Vec<NaiveDate>,
}
