use mongodb::{Database, bson::doc};
use tracing::debug;

use super::{
    config::MongoConfig,
    error::{MongoDaoError, MongoResult},
};

/// Open the configured database and make sure the server answers a ping.
///
/// A single attempt is made; retries and backoff belong to the storage supervisor.
pub async fn open_database(config: &MongoConfig) -> MongoResult<Database> {
    let client = mongodb::Client::with_options(config.options.clone())
        .map_err(|source| MongoDaoError::ClientConstruction { source })?;
    let database = client.database(&config.database_name);

    database
        .run_command(doc! { "ping": 1 })
        .await
        .map_err(|source| MongoDaoError::Ping { source })?;

    debug!(database = %config.database_name, "MongoDB answered ping");
    Ok(database)
}
