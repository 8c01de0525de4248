use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use rand::rngs::StdRng;
use rand::SeedableRng;
use time::OffsetDateTime;
use tracing::{error, instrument, warn};

use super::dto::{GeneratedPlanResponse, UserSettings};
use crate::{error::PlanError, state::AppState};

pub fn plan_routes() -> Router<AppState> {
    Router::new().route("/meal-plans", post(create_meal_plan))
}

/// POST /meal-plans { gender, calories, cookingStyle, exclusions?, preferences? }
#[instrument(skip(state, settings))]
pub async fn create_meal_plan(
    State(state): State<AppState>,
    Json(settings): Json<UserSettings>,
) -> Result<Json<GeneratedPlanResponse>, (StatusCode, String)> {
    let api_key = (state.credential)();
    let mut rng = StdRng::from_entropy();

    let generated = state
        .requester
        .generate_plan(api_key.as_deref(), &settings, &mut rng)
        .await
        .map_err(|e| {
            match &e {
                PlanError::InvalidSettings(msg) => warn!(%msg, "rejected settings"),
                _ => error!(error = %e, "meal plan generation failed"),
            }
            (e.status(), e.to_string())
        })?;

    Ok(Json(GeneratedPlanResponse {
        model: generated.model,
        generated_at: OffsetDateTime::now_utc(),
        daily_totals: generated.plan.daily_totals(),
        plan: generated.plan,
    }))
}
