pub mod dto;
mod handlers;
pub mod prompt;
mod schema;
pub mod services;

use crate::state::AppState;
use axum::Router;

pub fn router() -> Router<AppState> {
    handlers::plan_routes()
}
