use actix_web::{web, HttpResponse, Responder};
use futures::TryStreamExt;
use mongodb::bson::{doc, oid::ObjectId};
use mongodb::{Client, Collection};
use serde_json::json;
use std::sync::Arc;

use crate::db::mongo::{CREDITS, GARDEN_DB, USERS};
use crate::middleware::auth::Claims;
use crate::models::account::{CreditTransaction, User};

pub async fn get_balance(data: web::Data<Arc<Client>>, claims: Claims) -> impl Responder {
    let client = data.into_inner();
    let collection: Collection<User> = client.database(GARDEN_DB).collection(USERS);

    let user_id = match ObjectId::parse_str(&claims.user_id) {
        Ok(id) => id,
        Err(_) => return HttpResponse::BadRequest().body("Invalid user ID"),
    };

    match collection.find_one(doc! { "_id": user_id }).await {
        Ok(Some(user)) => HttpResponse::Ok().json(json!({
            "credits": user.credits.unwrap_or(0)
        })),
        Ok(None) => HttpResponse::NotFound().body("User not found"),
        Err(err) => {
            log::error!("Failed to fetch user: {:?}", err);
            HttpResponse::InternalServerError().body("Failed to fetch balance")
        }
    }
}

/// The caller's ledger, newest first.
pub async fn get_history(data: web::Data<Arc<Client>>, claims: Claims) -> impl Responder {
    let client = data.into_inner();
    let collection: Collection<CreditTransaction> =
        client.database(GARDEN_DB).collection(CREDITS);

    let user_id = match ObjectId::parse_str(&claims.user_id) {
        Ok(id) => id,
        Err(_) => return HttpResponse::BadRequest().body("Invalid user ID"),
    };

    match collection
        .find(doc! { "user_id": user_id })
        .sort(doc! { "created_at": -1 })
        .await
    {
        Ok(cursor) => match cursor.try_collect::<Vec<CreditTransaction>>().await {
            Ok(transactions) => HttpResponse::Ok().json(transactions),
            Err(err) => {
                log::error!("Error retrieving transactions: {:?}", err);
                HttpResponse::InternalServerError().body("Failed to retrieve transactions")
            }
        },
        Err(err) => {
            log::error!("Error fetching transactions: {:?}", err);
            HttpResponse::InternalServerError().body("Failed to fetch transactions")
        }
    }
}
