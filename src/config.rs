//! Process configuration read from the environment.

use std::fmt;
use std::time::Duration;

/// Longest token lifetime accepted from `TOKEN_TTL_SECS` (one year).
pub const MAX_TOKEN_TTL: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// Runtime configuration for the server.
#[derive(Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    /// HMAC secret used to sign and verify bearer tokens.
    pub jwt_secret: String,
    pub token_ttl: Duration,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Required: `DATABASE_URL`, `JWT_SECRET`.
    /// Optional: `HOST` (default `0.0.0.0`), `PORT` (default `5000`),
    /// `TOKEN_TTL_SECS` (default `3600`).
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")
            .map_err(|_| anyhow::anyhow!("DATABASE_URL environment variable is required"))?;

        let jwt_secret = std::env::var("JWT_SECRET")
            .map_err(|_| anyhow::anyhow!("JWT_SECRET environment variable is required"))?;
        if jwt_secret.is_empty() {
            anyhow::bail!("JWT_SECRET must not be empty");
        }

        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());

        let port = match std::env::var("PORT") {
            Ok(raw) => raw
                .parse()
                .map_err(|e| anyhow::anyhow!("invalid PORT {raw:?}: {e}"))?,
            Err(_) => 5000,
        };

        let token_ttl = match std::env::var("TOKEN_TTL_SECS") {
            Ok(raw) => parse_token_ttl(&raw)?,
            Err(_) => Duration::from_secs(3600),
        };

        tracing::info!(
            host = %host,
            port,
            token_ttl_secs = token_ttl.as_secs(),
            "configuration loaded"
        );

        Ok(Self {
            host,
            port,
            database_url,
            jwt_secret,
            token_ttl,
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database_url", &self.database_url)
            .field("jwt_secret", &"<redacted>")
            .field("token_ttl", &self.token_ttl)
            .finish()
    }
}

/// Parse a token lifetime in seconds, bounded by [`MAX_TOKEN_TTL`].
fn parse_token_ttl(raw: &str) -> anyhow::Result<Duration> {
    let secs: u64 = raw
        .parse()
        .map_err(|e| anyhow::anyhow!("invalid TOKEN_TTL_SECS {raw:?}: {e}"))?;
    let ttl = Duration::from_secs(secs);
    if ttl > MAX_TOKEN_TTL {
        anyhow::bail!(
            "TOKEN_TTL_SECS {secs} exceeds the maximum of {}",
            MAX_TOKEN_TTL.as_secs()
        );
    }
    Ok(ttl)
}
