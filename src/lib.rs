//! Courtside: pickleball venue directory API.
//!
//! Public venue, region and heat-map reads; signed-in submissions, feedback,
//! photos and favorites; and a cookie-session moderation console. The binary
//! in `main.rs` wires these modules into one axum router.

pub mod config;
pub mod error;
pub mod geo;
pub mod handlers;
pub mod middleware;
pub mod migration;
pub mod models;
pub mod response;
pub mod routes;
pub mod services;
pub mod utils;

pub use error::{AppError, AppResult};
pub use middleware::auth::AuthUser;
pub use response::{page_params, ApiResponse, PaginatedResponse, PaginationQuery};
pub use services::storage::{ObjectStorage, SharedStorage};
