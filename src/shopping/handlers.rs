use axum::{routing::post, Json, Router};
use serde::Serialize;
use tracing::{debug, instrument};

use super::services::{clipboard_text, shopping_list};
use crate::{plans::dto::MealPlanResult, state::AppState};

#[derive(Debug, Serialize)]
pub struct ShoppingListResponse {
    pub items: Vec<String>,
    pub count: usize,
    pub text: String,
}

pub fn shopping_routes() -> Router<AppState> {
    Router::new().route("/shopping-list", post(build_shopping_list))
}

/// POST /shopping-list with a previously generated plan.
#[instrument(skip(plan))]
pub async fn build_shopping_list(Json(plan): Json<MealPlanResult>) -> Json<ShoppingListResponse> {
    let items = shopping_list(plan.meals());
    debug!(count = items.len(), schema = ?plan.schema_version(), "shopping list built");
    Json(ShoppingListResponse {
        count: items.len(),
        text: clipboard_text(&items),
        items,
    })
}
