//! Shared application state.

use crate::auth::ApiKeyGate;

/// State handed to every handler
#[derive(Debug, Clone)]
pub struct AppState {
    /// Gate for the protected routes
    pub auth: ApiKeyGate,
}

impl AppState {
    /// Create the state around an authentication gate
    #[must_use]
    pub fn new(auth: ApiKeyGate) -> Self {
        Self { auth }
    }
}
