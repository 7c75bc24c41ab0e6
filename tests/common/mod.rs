use std::sync::Arc;

use mongodb::bson::oid::ObjectId;
use mongodb::Client;

use garden_api::models::account::UserRole;
use garden_api::routes::auth::generate_token;

pub const TEST_SECRET: &str = "garden_test_secret";

/// The driver connects lazily, so a client pointing at nothing is fine for
/// tests that never reach the database.
pub async fn detached_client() -> Arc<Client> {
    let client = Client::with_uri_str("mongodb://localhost:27017")
        .await
        .expect("failed to build test client");
    Arc::new(client)
}

pub fn set_test_secret() {
    std::env::set_var("JWT_SECRET", TEST_SECRET);
}

pub fn bearer(email: &str, role: UserRole) -> String {
    let token = generate_token(email, ObjectId::new(), role).expect("token generation failed");
    format!("Bearer {}", token)
}
