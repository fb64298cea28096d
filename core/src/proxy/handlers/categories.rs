//! Handles GET /api/categories

use axum::{extract::State, response::Json};

use crate::category::{self, CategoryConfig};
use crate::proxy::server::AppState;

/// Resolved fresh on every call; a bad setting only ever costs a warning
pub async fn handle_categories(State(state): State<AppState>) -> Json<CategoryConfig> {
    Json(category::from_settings(&state.categories))
}
