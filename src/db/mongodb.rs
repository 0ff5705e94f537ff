use anyhow::{Context, Result};
use mongodb::{Client, Database, bson::doc};

/// Connect to MongoDB and make sure the server answers
pub async fn get_database(uri: &str, db_name: &str) -> Result<Database> {
    let client = Client::with_uri_str(uri)
        .await
        .context("Failed to create MongoDB client")?;

    let db = client.database(db_name);
    db.run_command(doc! { "ping": 1 })
        .await
        .context("MongoDB did not answer ping")?;

    log::info!("Connected to MongoDB database {}", db_name);
    Ok(db)
}
