use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::error::PlanError;

pub const MIN_CALORIES: u32 = 900;
pub const MAX_CALORIES: u32 = 2000;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Gender {
    Female,
    Male,
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Gender::Female => f.write_str("Female"),
            Gender::Male => f.write_str("Male"),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum CookingStyle {
    #[serde(rename = "Quick & Easy")]
    QuickAndEasy,
    #[serde(rename = "Balanced Mix")]
    BalancedMix,
    #[serde(rename = "Home Cooked")]
    HomeCooked,
}

impl fmt::Display for CookingStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            CookingStyle::QuickAndEasy => "Quick & Easy",
            CookingStyle::BalancedMix => "Balanced Mix",
            CookingStyle::HomeCooked => "Home Cooked",
        };
        f.write_str(label)
    }
}

/// Form input for one plan request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserSettings {
    pub gender: Gender,
    pub calories: u32,
    pub cooking_style: CookingStyle,
    #[serde(default)]
    pub exclusions: String,
    #[serde(default)]
    pub preferences: String,
}

impl UserSettings {
    pub fn validate(&self) -> Result<(), PlanError> {
        if !(MIN_CALORIES..=MAX_CALORIES).contains(&self.calories) {
            return Err(PlanError::InvalidSettings(format!(
                "calories must be between {} and {}, got {}",
                MIN_CALORIES, MAX_CALORIES, self.calories
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct Macro {
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
}

impl Macro {
    pub fn total<'a>(meals: impl IntoIterator<Item = &'a Meal>) -> Macro {
        meals.into_iter().fold(Macro::default(), |acc, m| Macro {
            calories: acc.calories + m.macros.calories,
            protein: acc.protein + m.macros.protein,
            carbs: acc.carbs + m.macros.carbs,
            fat: acc.fat + m.macros.fat,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Meal {
    #[serde(rename = "type")]
    pub kind: String,
    pub title: String,
    pub description: String,
    pub prep_time: String,
    pub macros: Macro,
    pub ingredients: Vec<String>,
    pub instructions: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MealSlot {
    pub title: String,
    pub options: Vec<Meal>,
}

/// Five meals with model-reported daily totals.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FlatPlan {
    pub summary: Macro,
    pub meals: Vec<Meal>,
}

/// Five meal slots, three interchangeable options each.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SlottedPlan {
    pub slots: Vec<MealSlot>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SchemaVersion {
    Flat,
    Slotted,
}

impl FromStr for SchemaVersion {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "flat" => Ok(SchemaVersion::Flat),
            "slotted" => Ok(SchemaVersion::Slotted),
            other => anyhow::bail!("unknown schema version '{}'", other),
        }
    }
}

/// A generated plan. The variant is chosen by the active schema version,
/// never by sniffing the payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "schemaVersion", rename_all = "lowercase")]
pub enum MealPlanResult {
    Flat(FlatPlan),
    Slotted(SlottedPlan),
}

impl MealPlanResult {
    pub fn parse(version: SchemaVersion, text: &str) -> Result<Self, serde_json::Error> {
        Ok(match version {
            SchemaVersion::Flat => MealPlanResult::Flat(serde_json::from_str(text)?),
            SchemaVersion::Slotted => MealPlanResult::Slotted(serde_json::from_str(text)?),
        })
    }

    pub fn schema_version(&self) -> SchemaVersion {
        match self {
            MealPlanResult::Flat(_) => SchemaVersion::Flat,
            MealPlanResult::Slotted(_) => SchemaVersion::Slotted,
        }
    }

    /// Every meal in display order; for slots, each option in turn.
    pub fn meals(&self) -> Box<dyn Iterator<Item = &Meal> + '_> {
        match self {
            MealPlanResult::Flat(p) => Box::new(p.meals.iter()),
            MealPlanResult::Slotted(p) => Box::new(p.slots.iter().flat_map(|s| s.options.iter())),
        }
    }

    /// Day totals. Flat plans keep the model's summary; slotted plans sum
    /// the first option of each slot.
    pub fn daily_totals(&self) -> Macro {
        match self {
            MealPlanResult::Flat(p) => p.summary,
            MealPlanResult::Slotted(p) => Macro::total(p.slots.iter().filter_map(|s| s.options.first())),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedPlanResponse {
    pub model: String,
    #[serde(with = "time::serde::rfc3339")]
    pub generated_at: OffsetDateTime,
    pub daily_totals: Macro,
    pub plan: MealPlanResult,
}
