use mongodb::{
    bson::doc,
    options::{ClientOptions, IndexOptions, ServerApi, ServerApiVersion},
    Client, IndexModel,
};
use std::sync::Arc;
use std::time::Duration;

pub const GARDEN_DB: &str = "Garden";

pub const ACCOMMODATIONS: &str = "Accommodations";
pub const BOOKINGS: &str = "Bookings";
pub const AVAILABILITY: &str = "Availability";
pub const USERS: &str = "Users";
pub const CREDITS: &str = "Credits";
pub const SCHEDULING_RULES: &str = "SchedulingRules";
pub const APPLICATIONS: &str = "Applications";

pub async fn create_mongo_client(uri: &str) -> Arc<Client> {
    log::info!("Connecting to MongoDB");

    let mut client_options = ClientOptions::parse(uri)
        .await
        .expect("MongoDB URI may be incorrect! Failed to parse.");

    client_options.connect_timeout = Some(Duration::from_secs(10));
    client_options.server_selection_timeout = Some(Duration::from_secs(10));
    client_options.max_pool_size = Some(10);
    client_options.min_pool_size = Some(1);

    let server_api = ServerApi::builder().version(ServerApiVersion::V1).build();
    client_options.server_api = Some(server_api);

    let client =
        Client::with_options(client_options).expect("Failed to create MongoDB client with options");

    match client
        .database(GARDEN_DB)
        .run_command(doc! {"ping": 1})
        .await
    {
        Ok(_) => log::info!("Connected to MongoDB and verified with ping command"),
        Err(e) => {
            log::warn!("Connected to MongoDB but ping test failed: {}", e);
            log::warn!("The API may still work, but some functionality might be impaired");
        }
    }

    Arc::new(client)
}

/// Indexes the booking pipeline relies on. The unique (accommodation_id,
/// date) index is what turns two racing submissions for the same nights into
/// one booking and one duplicate-key error.
pub async fn ensure_indexes(client: &Client) -> mongodb::error::Result<()> {
    let db = client.database(GARDEN_DB);

    let availability_index = IndexModel::builder()
        .keys(doc! { "accommodation_id": 1, "date": 1 })
        .options(IndexOptions::builder().unique(true).build())
        .build();
    db.collection::<crate::models::bookings::AvailabilityRecord>(AVAILABILITY)
        .create_index(availability_index)
        .await?;

    let email_index = IndexModel::builder()
        .keys(doc! { "email": 1 })
        .options(IndexOptions::builder().unique(true).build())
        .build();
    db.collection::<crate::models::account::User>(USERS)
        .create_index(email_index)
        .await?;

    Ok(())
}
