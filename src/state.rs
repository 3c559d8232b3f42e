use std::sync::Arc;

use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};

use crate::config::Config;
use crate::token::TokenVerifier;

/// Shared handles injected into every handler at startup.
#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub tokens: Arc<TokenVerifier>,
}

impl AppState {
    pub fn new(db: DatabaseConnection, tokens: TokenVerifier) -> Self {
        Self {
            db,
            tokens: Arc::new(tokens),
        }
    }

    /// Open the connection pool and build the token verifier from `config`.
    pub async fn connect(config: &Config) -> Result<Self, DbErr> {
        let mut opts = ConnectOptions::new(config.database_url.clone());
        opts.sqlx_logging(false);
        let db = Database::connect(opts).await?;
        tracing::info!("database connected");

        let tokens = TokenVerifier::new(config.jwt_secret.as_bytes(), config.token_ttl);
        Ok(Self::new(db, tokens))
    }
}
