use sqlx::{postgres::PgPoolOptions, Pool, Postgres};

use crate::config::Config;

use super::error::QueryError;

pub async fn connect(config: &Config) -> Result<Pool<Postgres>, potion::Error> {
    log::info!(
        "Connecting to database ({} connections max)",
        config.database_max_connections
    );

    PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect(&config.database_url)
        .await
        .map_err(|e| QueryError::from(e).into())
}
