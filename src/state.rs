use crate::config::{api_key_from_env, AppConfig};
use crate::gemini::{GeminiClient, GenerationClient};
use crate::plans::services::PlanRequester;
use std::sync::Arc;

pub type CredentialSource = Arc<dyn Fn() -> Option<String> + Send + Sync>;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub requester: Arc<PlanRequester>,
    /// Looked up on every request; the key is never cached.
    pub credential: CredentialSource,
}

impl AppState {
    pub fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);
        let client = Arc::new(GeminiClient::new(&config.gemini)?) as Arc<dyn GenerationClient>;
        Ok(Self::from_parts(config, client, Arc::new(api_key_from_env)))
    }

    pub fn from_parts(
        config: Arc<AppConfig>,
        client: Arc<dyn GenerationClient>,
        credential: CredentialSource,
    ) -> Self {
        let requester = Arc::new(PlanRequester::new(
            client,
            config.gemini.models.clone(),
            config.planner,
        ));
        Self {
            config,
            requester,
            credential,
        }
    }

    #[cfg(test)]
    pub fn fake(
        replies: Vec<Result<Option<String>, crate::gemini::ClientError>>,
        api_key: Option<&str>,
    ) -> Self {
        use crate::config::{GeminiConfig, PlannerConfig};
        use crate::plans::dto::SchemaVersion;
        use crate::plans::prompt::MacroPolicy;
        use crate::plans::services::fakes::ScriptedClient;

        let config = Arc::new(AppConfig {
            gemini: GeminiConfig {
                base_url: "http://fake.local".into(),
                models: vec![
                    "fake-smart".into(),
                    "fake-stable".into(),
                    "fake-cheap".into(),
                ],
                timeout_secs: None,
            },
            planner: PlannerConfig {
                schema_version: SchemaVersion::Flat,
                macro_policy: MacroPolicy::Split,
            },
        });
        let client = Arc::new(ScriptedClient::new(replies)) as Arc<dyn GenerationClient>;
        let key = api_key.map(str::to_string);
        Self::from_parts(config, client, Arc::new(move || key.clone()))
    }
}
