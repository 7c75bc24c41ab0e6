use actix_web::{web, HttpResponse, Responder};
use chrono::Utc;
use futures::TryStreamExt;
use mongodb::bson::{doc, oid::ObjectId};
use mongodb::{Client, Collection};
use std::sync::Arc;

use crate::db::mongo::{APPLICATIONS, GARDEN_DB};
use crate::middleware::auth::Claims;
use crate::models::application::{
    ApplicationInput, ApplicationReview, ApplicationStatus, GuestApplication,
};

/// Submit the vetting questionnaire. One pending application per user.
pub async fn submit_application(
    data: web::Data<Arc<Client>>,
    input: web::Json<ApplicationInput>,
    claims: Claims,
) -> impl Responder {
    let client = data.into_inner();
    let collection: Collection<GuestApplication> =
        client.database(GARDEN_DB).collection(APPLICATIONS);

    let user_id = match ObjectId::parse_str(&claims.user_id) {
        Ok(id) => id,
        Err(_) => return HttpResponse::BadRequest().body("Invalid user ID"),
    };

    let input = input.into_inner();
    if input.answers.is_empty() {
        return HttpResponse::BadRequest().body("Application must contain answers");
    }

    let pending_filter = doc! { "user_id": user_id, "status": "pending" };
    match collection.find_one(pending_filter).await {
        Ok(Some(_)) => {
            return HttpResponse::Conflict().body("An application is already under review")
        }
        Ok(None) => {}
        Err(err) => {
            log::error!("Error checking for applications: {:?}", err);
            return HttpResponse::InternalServerError().body("Failed to check for applications");
        }
    }

    let time = Utc::now();
    let application = GuestApplication {
        id: None,
        user_id,
        answers: input.answers,
        status: ApplicationStatus::Pending,
        created_at: Some(time),
        updated_at: Some(time),
    };

    match collection.insert_one(&application).await {
        Ok(_) => HttpResponse::Ok().body("Application submitted"),
        Err(err) => {
            log::error!("Error creating application: {:?}", err);
            HttpResponse::InternalServerError().body("Failed to submit application")
        }
    }
}

/// Admin review queue, newest first.
pub async fn list_applications(data: web::Data<Arc<Client>>) -> impl Responder {
    let client = data.into_inner();
    let collection: Collection<GuestApplication> =
        client.database(GARDEN_DB).collection(APPLICATIONS);

    match collection
        .find(doc! {})
        .sort(doc! { "created_at": -1 })
        .await
    {
        Ok(cursor) => match cursor.try_collect::<Vec<GuestApplication>>().await {
            Ok(applications) => HttpResponse::Ok().json(applications),
            Err(err) => {
                log::error!("Error retrieving applications: {:?}", err);
                HttpResponse::InternalServerError().body("Failed to retrieve applications")
            }
        },
        Err(err) => {
            log::error!("Error fetching applications: {:?}", err);
            HttpResponse::InternalServerError().body("Failed to fetch applications")
        }
    }
}

pub async fn review_application(
    data: web::Data<Arc<Client>>,
    path: web::Path<String>,
    input: web::Json<ApplicationReview>,
) -> impl Responder {
    let client = data.into_inner();
    let collection: Collection<GuestApplication> =
        client.database(GARDEN_DB).collection(APPLICATIONS);

    let application_id = match ObjectId::parse_str(path.into_inner()) {
        Ok(id) => id,
        Err(_) => return HttpResponse::BadRequest().body("Invalid application ID"),
    };

    let status = match input.status {
        ApplicationStatus::Approved => "approved",
        ApplicationStatus::Rejected => "rejected",
        ApplicationStatus::Pending => {
            return HttpResponse::BadRequest().body("Review must approve or reject")
        }
    };

    let update = doc! {
        "$set": {
            "status": status,
            "updated_at": Utc::now().to_rfc3339()
        }
    };

    match collection
        .update_one(doc! { "_id": application_id }, update)
        .await
    {
        Ok(result) => {
            if result.matched_count == 0 {
                return HttpResponse::NotFound().body("Application not found");
            }
            HttpResponse::Ok().body("Application reviewed")
        }
        Err(err) => {
            log::error!("Error updating application: {:?}", err);
            HttpResponse::InternalServerError().body("Failed to update application")
        }
    }
}
