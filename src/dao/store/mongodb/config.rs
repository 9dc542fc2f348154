use std::time::Duration;

use mongodb::options::ClientOptions;

use super::error::{MongoDaoError, MongoResult};

const DEFAULT_DB: &str = "playkers";
/// Keeps a dead server from stalling a request longer than the health poll interval.
const SERVER_SELECTION_TIMEOUT: Duration = Duration::from_secs(3);

/// Connection settings for [`MongoStore`](super::MongoStore).
#[derive(Clone)]
pub struct MongoConfig {
    pub options: ClientOptions,
    pub database_name: String,
}

impl MongoConfig {
    /// Parse `uri`, falling back to the `playkers` database when none is named.
    pub async fn from_uri(uri: &str, db_name: Option<&str>) -> MongoResult<Self> {
        let mut options = ClientOptions::parse(uri)
            .await
            .map_err(|source| MongoDaoError::InvalidUri {
                uri: uri.to_owned(),
                source,
            })?;
        options.app_name.get_or_insert_with(|| "playkers-back".to_owned());
        options
            .server_selection_timeout
            .get_or_insert(SERVER_SELECTION_TIMEOUT);

        let database_name = db_name
            .or(options.default_database.as_deref())
            .unwrap_or(DEFAULT_DB)
            .to_owned();

        Ok(Self {
            options,
            database_name,
        })
    }
}
