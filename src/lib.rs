//! Blog API - accounts and posts over HTTP
//!
//! Users sign up and log in to receive a bearer token; posts are created,
//! edited and deleted by their owner, and public posts can be searched by
//! anyone.
//!
//! # Authentication
//!
//! Every route sits behind [`AuthGate`] except the exact paths listed in
//! [`gate::PUBLIC_PATHS`]. The gate verifies the `Authorization: Bearer <token>`
//! header and attaches the caller's [`Identity`] to the request.
//!
//! # Architecture
//!
//! - **AppState**: database pool and token verifier, built once at startup
//! - **store**: parameterized SeaORM queries, no business rules
//! - **api**: poem-openapi operations that enforce ownership

mod api;
pub mod config;
pub mod entities;
pub mod error;
pub mod gate;
mod state;
pub mod store;
pub mod token;

use poem::middleware::{Cors, NormalizePath, Tracing, TrailingSlash};
use poem::{Endpoint, EndpointExt, Route};
use poem_openapi::OpenApiService;

pub use self::config::Config;
pub use self::error::{ApiError, AuthError, StoreError};
pub use self::gate::AuthGate;
pub use self::state::AppState;
pub use self::token::{Identity, TokenVerifier};

/// Build the complete HTTP application.
///
/// `/docs` serves the Swagger UI and is not gated; everything else goes
/// through [`AuthGate`]. The gate matches the path as sent, then trailing
/// slashes are trimmed so `POST /post/` and `POST /post` reach the same
/// operation. Unknown routes answer with the usual `{"error": ..}` body.
pub fn app(state: AppState) -> impl Endpoint {
    let gate = AuthGate::new(state.tokens.clone());
    let api = OpenApiService::new(
        (
            api::RootApi,
            api::UserApi::new(state.clone()),
            api::PostApi::new(state),
        ),
        "Blog API",
        env!("CARGO_PKG_VERSION"),
    );
    let ui = api.swagger_ui();

    Route::new()
        .nest("/docs", ui)
        .nest(
            "/",
            api.with(NormalizePath::new(TrailingSlash::Trim)).with(gate),
        )
        .catch_error(error::not_found)
        .with(Cors::new())
        .with(Tracing)
}
