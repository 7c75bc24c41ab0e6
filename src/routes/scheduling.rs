use actix_web::{web, HttpResponse, Responder};
use chrono::Utc;
use futures::TryStreamExt;
use mongodb::bson::{doc, oid::ObjectId, to_bson};
use mongodb::{Client, Collection};
use std::sync::Arc;

use crate::db::mongo::{GARDEN_DB, SCHEDULING_RULES};
use crate::models::scheduling::{SchedulingRule, SchedulingRuleInput};

/// Rules ordered by start date; the client calendar reads these to decide
/// which weeks it may offer.
pub async fn list_rules(data: web::Data<Arc<Client>>) -> impl Responder {
    let client = data.into_inner();
    let collection: Collection<SchedulingRule> =
        client.database(GARDEN_DB).collection(SCHEDULING_RULES);

    match collection
        .find(doc! {})
        .sort(doc! { "start_date": 1 })
        .await
    {
        Ok(cursor) => match cursor.try_collect::<Vec<SchedulingRule>>().await {
            Ok(rules) => HttpResponse::Ok().json(rules),
            Err(err) => {
                log::error!("Error retrieving scheduling rules: {:?}", err);
                HttpResponse::InternalServerError().body("Failed to retrieve scheduling rules")
            }
        },
        Err(err) => {
            log::error!("Error fetching scheduling rules: {:?}", err);
            HttpResponse::InternalServerError().body("Failed to fetch scheduling rules")
        }
    }
}

pub async fn create_rule(
    data: web::Data<Arc<Client>>,
    input: web::Json<SchedulingRuleInput>,
) -> impl Responder {
    let client = data.into_inner();
    let collection: Collection<SchedulingRule> =
        client.database(GARDEN_DB).collection(SCHEDULING_RULES);

    let input = input.into_inner();
    if input.end_date < input.start_date {
        return HttpResponse::BadRequest().body("end_date must not precede start_date");
    }

    let time = Utc::now();
    let rule = SchedulingRule {
        id: None,
        start_date: input.start_date,
        end_date: input.end_date,
        arrival_day: input.arrival_day,
        departure_day: input.departure_day,
        is_blocked: input.is_blocked,
        blocked_dates: input.blocked_dates,
        created_at: Some(time),
        updated_at: Some(time),
    };

    match collection.insert_one(&rule).await {
        Ok(_) => HttpResponse::Ok().body("Rule created"),
        Err(err) => {
            log::error!("Error creating scheduling rule: {:?}", err);
            HttpResponse::InternalServerError().body("Failed to create rule")
        }
    }
}

pub async fn update_rule(
    data: web::Data<Arc<Client>>,
    path: web::Path<String>,
    input: web::Json<SchedulingRuleInput>,
) -> impl Responder {
    let client = data.into_inner();
    let collection: Collection<SchedulingRule> =
        client.database(GARDEN_DB).collection(SCHEDULING_RULES);

    let rule_id = match ObjectId::parse_str(path.into_inner()) {
        Ok(id) => id,
        Err(_) => return HttpResponse::BadRequest().body("Invalid rule ID"),
    };

    let input = input.into_inner();
    if input.end_date < input.start_date {
        return HttpResponse::BadRequest().body("end_date must not precede start_date");
    }

    let blocked_dates = match to_bson(&input.blocked_dates) {
        Ok(bson) => bson,
        Err(err) => {
            log::error!("Failed to serialize blocked dates: {:?}", err);
            return HttpResponse::InternalServerError().body("Failed to update rule");
        }
    };

    let update = doc! {
        "$set": {
            "start_date": input.start_date.to_string(),
            "end_date": input.end_date.to_string(),
            "arrival_day": input.arrival_day,
            "departure_day": input.departure_day,
            "is_blocked": input.is_blocked,
            "blocked_dates": blocked_dates,
            "updated_at": Utc::now().to_rfc3339()
        }
    };

    match collection.update_one(doc! { "_id": rule_id }, update).await {
        Ok(result) => {
            if result.matched_count == 0 {
                return HttpResponse::NotFound().body("Rule not found");
            }
            HttpResponse::Ok().body("Rule updated")
        }
        Err(err) => {
            log::error!("Error updating scheduling rule: {:?}", err);
            HttpResponse::InternalServerError().body("Failed to update rule")
        }
    }
}

pub async fn delete_rule(data: web::Data<Arc<Client>>, path: web::Path<String>) -> impl Responder {
    let client = data.into_inner();
    let collection: Collection<SchedulingRule> =
        client.database(GARDEN_DB).collection(SCHEDULING_RULES);

    let rule_id = match ObjectId::parse_str(path.into_inner()) {
        Ok(id) => id,
        Err(_) => return HttpResponse::BadRequest().body("Invalid rule ID"),
    };

    match collection.delete_one(doc! { "_id": rule_id }).await {
        Ok(result) => {
            if result.deleted_count == 0 {
                return HttpResponse::NotFound().body("Rule not found");
            }
            HttpResponse::Ok().body("Rule deleted")
        }
        Err(err) => {
            log::error!("Error deleting scheduling rule: {:?}", err);
            HttpResponse::InternalServerError().body("Failed to delete rule")
        }
    }
}
