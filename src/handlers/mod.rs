/// Web API Handlers
///
/// This module contains the handlers for the RESTful API endpoints.
/// Each handler is responsible for processing a specific type of HTTP request,
/// extracting the necessary data, calling the appropriate repository functions,
/// and returning a properly formatted response.
///
/// Every handler except registration and login takes a `CurrentUser`, so
/// the acting user is always explicit.

mod profile_handlers;
mod task_handlers;
mod schedule_handlers;
mod study_session_handlers;
mod chat_handlers;
mod ai_handlers;
mod social_handlers;
mod dashboard_handlers;

// Re-export all handlers
pub use profile_handlers::*;
pub use task_handlers::*;
pub use schedule_handlers::*;
pub use study_session_handlers::*;
pub use chat_handlers::*;
pub use ai_handlers::*;
pub use social_handlers::*;
pub use dashboard_handlers::*;

use crate::errors::ApiError;

/// Rejects blank text fields
fn require_text(field: &str, value: &str) -> Result<(), ApiError> {
    if value.trim().is_empty() {
        return Err(ApiError::Validation(format!("{field} must not be empty")));
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::AppState;
    use crate::ai::{Dispatcher, HttpTransport, ModelLadder, RetryPolicy};
    use crate::repo::tests::setup_test_db;
    use crate::session::{self, CurrentUser};
    use std::sync::Arc;
    use std::time::Duration;

    /// State whose gateway points at a closed port
    pub fn test_state() -> AppState {
        let transport = HttpTransport::new(
            "http://127.0.0.1:9/v1/chat/completions".to_string(),
            None,
            Duration::from_secs(1),
        )
        .unwrap();
        let ladder = ModelLadder::new(["test-model"]).unwrap();
        AppState {
            pool: setup_test_db(),
            ai: Arc::new(Dispatcher::new(transport, ladder, RetryPolicy::immediate())),
        }
    }

    /// Registers a user and returns their restored session
    pub fn login(state: &AppState, name: &str) -> CurrentUser {
        let profile = crate::repo::create_profile(&state.pool, name.to_string(), format!("{name}@example.com")).unwrap();
        let ctx = session::init(&state.pool, &profile.get_id(), chrono::Utc::now().date_naive())
            .unwrap()
            .unwrap();
        CurrentUser(ctx)
    }
}
