use argon2::Argon2;
use password_hash::rand_core::OsRng;
use password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use poem_openapi::payload::Json;
use poem_openapi::{ApiResponse, Object, OpenApi};

use super::Message;
use crate::error::{ApiError, StoreError};
use crate::state::AppState;
use crate::store;

#[derive(Debug, Object)]
pub struct Credentials {
    username: String,
    #[oai(write_only)]
    password: String,
}

#[derive(Debug, Object)]
pub struct TokenBody {
    token: String,
}

#[derive(ApiResponse)]
enum SignupResponse {
    #[oai(status = 201)]
    Created(Json<Message>),
}

pub struct UserApi {
    state: AppState,
}

impl UserApi {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }
}

#[OpenApi]
impl UserApi {
    /// Register a new account
    #[oai(path = "/user/signup", method = "post")]
    async fn signup(&self, Json(input): Json<Credentials>) -> poem::Result<SignupResponse> {
        const FAILURE: &str = "Signup failed";
        let hash = hash_password(input.password)
            .await
            .map_err(ApiError::internal(FAILURE))?;

        let user = match store::insert_user(&self.state.db, input.username, hash).await {
            Ok(user) => user,
            Err(StoreError::Duplicate(_)) => return Err(ApiError::UsernameTaken.into()),
            Err(err) => return Err(ApiError::persistence(FAILURE)(err).into()),
        };

        tracing::info!(user_id = user.id, username = %user.username, "user registered");
        Ok(SignupResponse::Created(Json(Message::new(
            "User registered successfully",
        ))))
    }

    /// Exchange a username and password for a bearer token
    #[oai(path = "/user/login", method = "post")]
    async fn login(&self, Json(input): Json<Credentials>) -> poem::Result<Json<TokenBody>> {
        const FAILURE: &str = "Login failed";
        let user = store::user_by_username(&self.state.db, &input.username)
            .await
            .map_err(ApiError::persistence(FAILURE))?
            .ok_or(ApiError::BadCredentials)?;

        let matches = verify_password(input.password, user.password)
            .await
            .map_err(ApiError::internal(FAILURE))?;
        if !matches {
            tracing::debug!(user_id = user.id, "password mismatch");
            return Err(ApiError::BadCredentials.into());
        }

        let token = self
            .state
            .tokens
            .issue(user.id)
            .map_err(ApiError::internal(FAILURE))?;
        Ok(Json(TokenBody { token }))
    }
}

/// Argon2 with a fresh random salt, on the blocking pool.
async fn hash_password(password: String) -> anyhow::Result<String> {
    tokio::task::spawn_blocking(move || {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| anyhow::anyhow!("hashing password: {e}"))
    })
    .await?
}

/// `Ok(false)` means the password is wrong; `Err` means the stored hash is unusable.
async fn verify_password(password: String, stored: String) -> anyhow::Result<bool> {
    tokio::task::spawn_blocking(move || {
        let parsed =
            PasswordHash::new(&stored).map_err(|e| anyhow::anyhow!("parsing stored hash: {e}"))?;
        match Argon2::default().verify_password(password.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(password_hash::Error::Password) => Ok(false),
            Err(e) => Err(anyhow::anyhow!("verifying password: {e}")),
        }
    })
    .await?
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn hash_then_verify() {
        let hash = hash_password("hunter2".to_string()).await.unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("hunter2".to_string(), hash.clone()).await.unwrap());
        assert!(!verify_password("hunter3".to_string(), hash).await.unwrap());
    }

    #[tokio::test]
    async fn same_password_gets_distinct_salts() {
        let a = hash_password("pw".to_string()).await.unwrap();
        let b = hash_password("pw".to_string()).await.unwrap();
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn corrupt_hash_is_an_error() {
        assert!(verify_password("pw".to_string(), "plaintext".to_string()).await.is_err());
    }
}
