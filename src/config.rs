use std::fmt;
use std::str::FromStr;

use serde::Deserialize;

use crate::plans::dto::SchemaVersion;
use crate::plans::prompt::MacroPolicy;

/// Shown in the prompt persona and on exported shopping lists.
pub const CLINIC_NAME: &str = "Transition Medical Weight Loss";

pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Candidate models, tried in order: smartest, stable, cheapest.
pub const DEFAULT_MODELS: [&str; 3] = [
    "gemini-3-flash-preview",
    "gemini-flash-latest",
    "gemini-flash-lite-latest",
];

#[derive(Debug, Clone, Deserialize)]
pub struct GeminiConfig {
    pub base_url: String,
    pub models: Vec<String>,
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PlannerConfig {
    pub schema_version: SchemaVersion,
    pub macro_policy: MacroPolicy,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub gemini: GeminiConfig,
    pub planner: PlannerConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let models = match std::env::var("GEMINI_MODELS") {
            Ok(raw) => parse_models(&raw),
            Err(_) => DEFAULT_MODELS.iter().map(|m| m.to_string()).collect(),
        };
        anyhow::ensure!(!models.is_empty(), "GEMINI_MODELS must name at least one model");

        let gemini = GeminiConfig {
            base_url: std::env::var("GEMINI_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_GEMINI_BASE_URL.into()),
            models,
            timeout_secs: std::env::var("GEMINI_TIMEOUT_SECS")
                .ok()
                .map(|v| parse_value::<u64>("GEMINI_TIMEOUT_SECS", &v))
                .transpose()?,
        };
        let planner = PlannerConfig {
            schema_version: env_or("PLAN_SCHEMA", SchemaVersion::Slotted)?,
            macro_policy: env_or("MACRO_POLICY", MacroPolicy::Tiered)?,
        };
        Ok(Self { gemini, planner })
    }
}

/// Reads the generation credential. Called per request, not at startup.
pub fn api_key_from_env() -> Option<String> {
    std::env::var("API_KEY")
        .ok()
        .map(|k| k.trim().to_string())
        .filter(|k| !k.is_empty())
}

fn parse_models(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_value<T>(key: &str, raw: &str) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    raw.trim()
        .parse::<T>()
        .map_err(|e| anyhow::anyhow!("invalid {}: {}", key, e))
}

fn env_or<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    match std::env::var(key) {
        Ok(v) => parse_value(key, &v),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod config_tests {
    use super::*;

    #[test]
    fn models_list_skips_blank_entries() {
        let models = parse_models(" gemini-a, ,gemini-b,");
        assert_eq!(models, vec!["gemini-a".to_string(), "gemini-b".to_string()]);
    }

    #[test]
    fn typed_values_reject_garbage() {
        assert_eq!(parse_value::<u64>("GEMINI_TIMEOUT_SECS", " 30 ").unwrap(), 30);
        let err = parse_value::<u64>("GEMINI_TIMEOUT_SECS", "soon").unwrap_err();
        assert!(err.to_string().starts_with("invalid GEMINI_TIMEOUT_SECS"));
        let err = parse_value::<SchemaVersion>("PLAN_SCHEMA", "nested").unwrap_err();
        assert!(err.to_string().contains("unknown schema version"));
    }

    #[test]
    fn models_list_from_blank_string_is_empty() {
        assert!(parse_models("  ,  ").is_empty());
    }
}
