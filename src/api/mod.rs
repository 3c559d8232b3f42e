//! HTTP operations, grouped by resource.

mod post;
mod user;

use poem_openapi::{Object, OpenApi, payload::PlainText};

pub use self::post::PostApi;
pub use self::user::UserApi;

/// `{"message": ...}` confirmation body.
#[derive(Debug, Object)]
pub struct Message {
    pub message: String,
}

impl Message {
    pub fn new(message: &str) -> Self {
        Self {
            message: message.to_string(),
        }
    }
}

pub struct RootApi;

#[OpenApi]
impl RootApi {
    /// Liveness check
    #[oai(path = "/", method = "get")]
    async fn index(&self) -> PlainText<String> {
        PlainText("Server is working ✅".to_string())
    }
}
