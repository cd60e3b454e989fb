pub mod app_state;
pub mod config;
pub mod model;
pub mod repo;
pub mod service;
pub mod user_handlers;
pub mod validation;

pub use app_state::AppState;
pub use common_http_errors::ApiError;
pub use model::{DeleteResponse, User, UserInput};
pub use repo::{InMemoryUserStore, PgUserStore, StoreError, UserStore};
pub use service::{UserService, UserServiceError};
pub use user_handlers::router;
