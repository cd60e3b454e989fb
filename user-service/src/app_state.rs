use crate::service::UserService;
use common_observability::UserServiceMetrics;

/// Shared application state used by handlers (kept out of main.rs so tests can build routers).
#[derive(Clone)]
pub struct AppState {
    pub service: UserService,
    pub metrics: UserServiceMetrics,
}

impl AppState {
    pub fn new(service: UserService, metrics: UserServiceMetrics) -> Self {
        Self { service, metrics }
    }
}
