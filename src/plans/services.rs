use std::sync::Arc;

use rand::Rng;
use tracing::{error, info, instrument, warn};

use super::dto::{MealPlanResult, UserSettings};
use super::prompt::{compose_prompt, pick_variety_hint, MacroTargets};
use super::schema::response_schema;
use crate::config::PlannerConfig;
use crate::error::{AttemptError, GenerationFailure, PlanError};
use crate::gemini::{GenerationClient, GenerationRequest, RESPONSE_MIME_JSON};

pub const TEMPERATURE: f32 = 0.7;

/// A plan together with the candidate model that produced it.
#[derive(Debug, Clone)]
pub struct GeneratedPlan {
    pub model: String,
    pub plan: MealPlanResult,
}

/// Builds the prompt and walks the candidate models in priority order.
/// Holds no per-request state, so one instance serves concurrent callers.
pub struct PlanRequester {
    client: Arc<dyn GenerationClient>,
    models: Vec<String>,
    planner: PlannerConfig,
}

impl PlanRequester {
    pub fn new(client: Arc<dyn GenerationClient>, models: Vec<String>, planner: PlannerConfig) -> Self {
        Self {
            client,
            models,
            planner,
        }
    }

    pub fn models(&self) -> &[String] {
        &self.models
    }

    fn build_prompt<R: Rng + ?Sized>(&self, settings: &UserSettings, rng: &mut R) -> String {
        let targets = MacroTargets::derive(self.planner.macro_policy, settings.calories);
        let hint = pick_variety_hint(rng);
        compose_prompt(settings, &targets, hint, self.planner.schema_version)
    }

    #[instrument(skip_all, fields(calories = settings.calories, schema = ?self.planner.schema_version))]
    pub async fn generate_plan<R: Rng + Send + ?Sized>(
        &self,
        api_key: Option<&str>,
        settings: &UserSettings,
        rng: &mut R,
    ) -> Result<GeneratedPlan, PlanError> {
        let Some(api_key) = api_key else {
            error!("API_KEY is not configured");
            return Err(PlanError::Configuration);
        };
        settings.validate()?;

        let prompt = self.build_prompt(settings, rng);
        let schema = response_schema(self.planner.schema_version);

        let mut last_error: Option<AttemptError> = None;
        for model in &self.models {
            info!(%model, "attempting generation");
            let request = GenerationRequest {
                model: model.clone(),
                prompt: prompt.clone(),
                response_schema: schema.clone(),
                temperature: TEMPERATURE,
                response_mime_type: RESPONSE_MIME_JSON,
            };
            match self.attempt(api_key, &request).await {
                Ok(plan) => {
                    info!(%model, "meal plan generated");
                    return Ok(GeneratedPlan {
                        model: model.clone(),
                        plan,
                    });
                }
                Err(e) => {
                    warn!(%model, error = %e, "model failed");
                    last_error = Some(e);
                }
            }
        }

        let failure = match &last_error {
            Some(e) => GenerationFailure::classify(e),
            None => GenerationFailure::NoCandidates,
        };
        error!(last_error = ?last_error, "all models failed");
        Err(PlanError::Generation(failure))
    }

    async fn attempt(
        &self,
        api_key: &str,
        request: &GenerationRequest,
    ) -> Result<MealPlanResult, AttemptError> {
        let text = self
            .client
            .generate(api_key, request)
            .await?
            .ok_or(AttemptError::EmptyResponse)?;
        Ok(MealPlanResult::parse(self.planner.schema_version, &text)?)
    }
}

#[cfg(test)]
pub(crate) mod fakes {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use crate::gemini::{ClientError, GenerationClient, GenerationRequest};

    /// Replays scripted replies in order and records every request it sees.
    #[derive(Default)]
    pub struct ScriptedClient {
        replies: Mutex<VecDeque<Result<Option<String>, ClientError>>>,
        pub seen: Mutex<Vec<GenerationRequest>>,
    }

    impl ScriptedClient {
        pub fn new(replies: Vec<Result<Option<String>, ClientError>>) -> Self {
            Self {
                replies: Mutex::new(replies.into()),
                seen: Mutex::new(Vec::new()),
            }
        }

        pub fn calls(&self) -> usize {
            self.seen.lock().unwrap().len()
        }

        pub fn models(&self) -> Vec<String> {
            self.seen.lock().unwrap().iter().map(|r| r.model.clone()).collect()
        }
    }

    #[async_trait]
    impl GenerationClient for ScriptedClient {
        async fn generate(
            &self,
            _api_key: &str,
            request: &GenerationRequest,
        ) -> Result<Option<String>, ClientError> {
            self.seen.lock().unwrap().push(request.clone());
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(ClientError::Transport("no scripted reply".into())))
        }
    }
}

#[cfg(test)]
mod requester_tests {
    use super::fakes::ScriptedClient;
    use super::*;
    use crate::gemini::ClientError;
    use crate::plans::dto::{CookingStyle, Gender, SchemaVersion};
    use crate::plans::prompt::MacroPolicy;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use reqwest::StatusCode;

    const SLOTTED: &str = r#"{"slots":[{"title":"Breakfast","options":[{
        "type":"Breakfast","title":"Oats","description":"Overnight oats","prepTime":"5 min",
        "macros":{"calories":320,"protein":25,"carbs":40,"fat":7},
        "ingredients":["Rolled oats","Milk"],"instructions":["Mix","Chill"]}]}]}"#;

    const MODELS: [&str; 3] = ["smart", "stable", "cheap"];

    fn settings() -> UserSettings {
        UserSettings {
            gender: Gender::Male,
            calories: 1500,
            cooking_style: CookingStyle::HomeCooked,
            exclusions: "shellfish".into(),
            preferences: String::new(),
        }
    }

    fn requester(client: Arc<ScriptedClient>) -> PlanRequester {
        PlanRequester::new(
            client,
            MODELS.iter().map(|m| m.to_string()).collect(),
            PlannerConfig {
                schema_version: SchemaVersion::Slotted,
                macro_policy: MacroPolicy::Tiered,
            },
        )
    }

    fn rng() -> StdRng {
        StdRng::seed_from_u64(42)
    }

    #[tokio::test]
    async fn missing_key_fails_without_network() {
        let client = Arc::new(ScriptedClient::new(vec![Ok(Some(SLOTTED.into()))]));
        let err = requester(client.clone())
            .generate_plan(None, &settings(), &mut rng())
            .await
            .unwrap_err();
        assert!(matches!(err, PlanError::Configuration));
        assert!(err.to_string().contains("API_KEY"));
        assert_eq!(client.calls(), 0);
    }

    #[tokio::test]
    async fn invalid_settings_fail_without_network() {
        let client = Arc::new(ScriptedClient::default());
        let mut s = settings();
        s.calories = 5000;
        let err = requester(client.clone())
            .generate_plan(Some("key"), &s, &mut rng())
            .await
            .unwrap_err();
        assert!(matches!(err, PlanError::InvalidSettings(_)));
        assert_eq!(client.calls(), 0);
    }

    #[tokio::test]
    async fn first_success_short_circuits() {
        let client = Arc::new(ScriptedClient::new(vec![Ok(Some(SLOTTED.into()))]));
        let out = requester(client.clone())
            .generate_plan(Some("key"), &settings(), &mut rng())
            .await
            .unwrap();
        assert_eq!(client.calls(), 1);
        assert_eq!(out.model, "smart");
        assert_eq!(out.plan.meals().count(), 1);

        let seen = client.seen.lock().unwrap();
        let req = &seen[0];
        assert_eq!(req.temperature, 0.7);
        assert_eq!(req.response_mime_type, "application/json");
        assert!(req.prompt.contains("shellfish"));
        assert_eq!(req.response_schema["required"][0], "slots");
    }

    #[tokio::test]
    async fn empty_and_malformed_replies_advance_to_next_model() {
        let client = Arc::new(ScriptedClient::new(vec![
            Ok(None),
            Ok(Some("```json\n{\"slots\": [}\n```".into())),
            Ok(Some(SLOTTED.into())),
        ]));
        let out = requester(client.clone())
            .generate_plan(Some("key"), &settings(), &mut rng())
            .await
            .unwrap();
        assert_eq!(client.models(), vec!["smart", "stable", "cheap"]);
        assert_eq!(out.model, "cheap");
    }

    #[tokio::test]
    async fn exhaustion_reports_last_failure() {
        let client = Arc::new(ScriptedClient::new(vec![
            Err(ClientError::Status {
                status: StatusCode::FORBIDDEN,
                body: "denied".into(),
            }),
            Err(ClientError::Transport("connection reset".into())),
            Err(ClientError::Status {
                status: StatusCode::TOO_MANY_REQUESTS,
                body: "RESOURCE_EXHAUSTED".into(),
            }),
        ]));
        let err = requester(client.clone())
            .generate_plan(Some("key"), &settings(), &mut rng())
            .await
            .unwrap_err();
        assert_eq!(client.calls(), MODELS.len());
        assert!(matches!(
            err,
            PlanError::Generation(GenerationFailure::QuotaExceeded)
        ));
    }

    #[tokio::test]
    async fn unclassified_last_failure_is_passed_through() {
        let client = Arc::new(ScriptedClient::new(vec![
            Err(ClientError::Status {
                status: StatusCode::TOO_MANY_REQUESTS,
                body: String::new(),
            }),
            Ok(None),
            Err(ClientError::Transport("dns lookup failed".into())),
        ]));
        let err = requester(client)
            .generate_plan(Some("key"), &settings(), &mut rng())
            .await
            .unwrap_err();
        assert!(err.to_string().ends_with("(request failed: dns lookup failed)"));
    }

    #[tokio::test]
    async fn same_seed_same_prompt() {
        let a = Arc::new(ScriptedClient::new(vec![Ok(Some(SLOTTED.into()))]));
        let b = Arc::new(ScriptedClient::new(vec![Ok(Some(SLOTTED.into()))]));
        requester(a.clone())
            .generate_plan(Some("key"), &settings(), &mut rng())
            .await
            .unwrap();
        requester(b.clone())
            .generate_plan(Some("key"), &settings(), &mut rng())
            .await
            .unwrap();
        let pa = a.seen.lock().unwrap()[0].prompt.clone();
        let pb = b.seen.lock().unwrap()[0].prompt.clone();
        assert_eq!(pa, pb);
    }
}
