use std::str::FromStr;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::Deserialize;

use super::dto::{SchemaVersion, UserSettings};
use crate::config::CLINIC_NAME;

const PROTEIN_KCAL_PER_G: f64 = 4.0;
const CARBS_KCAL_PER_G: f64 = 4.0;
const FAT_KCAL_PER_G: f64 = 9.0;

pub const VARIETY_HINTS: [&str; 8] = [
    "Focus on 'Classics made Healthy' - familiar tastes with better macros.",
    "Incorporate a 'One-Pan' or 'Sheet-Pan' concept for dinner.",
    "Focus on fresh, raw textures for lunch and warm, comforting textures for dinner.",
    "Use common pantry spices to add flavor without complexity.",
    "Try to include a breakfast that can be prepped in under 5 minutes.",
    "Focus on high-volume foods to maximize satiety.",
    "Incorporate a simple wrap or sandwich concept for lunch.",
    "Ensure dinner feels substantial but uses standard supermarket ingredients.",
];

const SLOT_ORDER: [&str; 5] = [
    "Breakfast",
    "Morning Snack",
    "Lunch",
    "Afternoon Snack",
    "Dinner",
];

/// How macro targets are derived from the calorie goal. One policy is
/// active per deployment.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MacroPolicy {
    /// Protein and carb ranges looked up by calorie band.
    Tiered,
    /// 35% protein, 35% carbs, 30% fat, in grams.
    Split,
}

impl FromStr for MacroPolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "tiered" => Ok(MacroPolicy::Tiered),
            "split" => Ok(MacroPolicy::Split),
            other => anyhow::bail!("unknown macro policy '{}'", other),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MacroGrams {
    pub protein: u32,
    pub carbs: u32,
    pub fat: u32,
}

impl MacroGrams {
    pub fn from_calories(calories: u32) -> Self {
        let kcal = f64::from(calories);
        Self {
            protein: (kcal * 0.35 / PROTEIN_KCAL_PER_G).round() as u32,
            carbs: (kcal * 0.35 / CARBS_KCAL_PER_G).round() as u32,
            fat: (kcal * 0.30 / FAT_KCAL_PER_G).round() as u32,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MacroTargets {
    Tiered {
        protein: &'static str,
        carbs: &'static str,
    },
    Split(MacroGrams),
}

impl MacroTargets {
    pub fn derive(policy: MacroPolicy, calories: u32) -> Self {
        match policy {
            MacroPolicy::Tiered => MacroTargets::Tiered {
                protein: if calories >= 1350 { "120-130g" } else { "approx 100g" },
                carbs: if calories < 1400 {
                    "60-100g"
                } else {
                    "100-150g (Focus on fiber-rich sources)"
                },
            },
            MacroPolicy::Split => MacroTargets::Split(MacroGrams::from_calories(calories)),
        }
    }

    fn prompt_lines(&self) -> String {
        match self {
            MacroTargets::Tiered { protein, carbs } => format!(
                "    - Protein Target: {}. Critical for muscle mass.\n    - Carbs Target: {}.",
                protein, carbs
            ),
            MacroTargets::Split(g) => format!(
                "    - Protein Target: {}g (35% of calories). Critical for muscle mass.\n    - Carbs Target: {}g (35% of calories).\n    - Fat Target: {}g (30% of calories).",
                g.protein, g.carbs, g.fat
            ),
        }
    }
}

pub fn pick_variety_hint<R: Rng + ?Sized>(rng: &mut R) -> &'static str {
    VARIETY_HINTS.choose(rng).copied().unwrap_or(VARIETY_HINTS[0])
}

fn or_none(text: &str) -> &str {
    let t = text.trim();
    if t.is_empty() {
        "None"
    } else {
        t
    }
}

fn structure_block(version: SchemaVersion) -> String {
    let order = SLOT_ORDER
        .iter()
        .enumerate()
        .map(|(i, s)| format!("    {}. {}", i + 1, s))
        .collect::<Vec<_>>()
        .join("\n");
    match version {
        SchemaVersion::Flat => format!(
            "    Structure:\n    Generate exactly 5 meals in this order:\n{}\n\n    Include a summary with the total calories, protein, carbs and fat for the day.",
            order
        ),
        SchemaVersion::Slotted => format!(
            "    Structure:\n    Generate exactly 5 meal slots in this order:\n{}\n\n    CRITICAL INSTRUCTION:\n    For EACH of the 5 slots, provide exactly 3 DISTINCT options (Option A, Option B, Option C).\n    - Ensure the 3 options are different in main ingredients/flavor (e.g., one egg-based, one yogurt-based, one oat-based).\n    - Ensure all options fit the macro goals for that time of day.",
            order
        ),
    }
}

/// Builds the instruction block sent to every candidate model.
pub fn compose_prompt(
    settings: &UserSettings,
    targets: &MacroTargets,
    variety_hint: &str,
    version: SchemaVersion,
) -> String {
    let options = match version {
        SchemaVersion::Flat => "",
        SchemaVersion::Slotted => " with multiple options per meal",
    };
    format!(
        r#"
    You are an expert medical nutritionist for {clinic}.
    Create a 1-day meal plan for a {gender} patient{options}.

    Target Calories: {calories}
    Cooking Style: {style}
    Exclusions/Allergies: {exclusions}
    Preferences: {preferences}

    Nutritional Goals:
{targets}
    - IMPORTANT: NOT a ketogenic diet. Focus on quality sources.
    - Hydration: Implicitly encourage water intake.

    Style & Complexity Guidelines:
    - KEEP IT SIMPLE: Use common supermarket ingredients.
    - REALISTIC: Ensure meals are easy to prepare.
    - VARIETY HINT: {hint}

{structure}

    Format Requirements:
    - Return strictly pure JSON matching the schema.
    - No markdown formatting.
"#,
        clinic = CLINIC_NAME,
        gender = settings.gender,
        options = options,
        calories = settings.calories,
        style = settings.cooking_style,
        exclusions = or_none(&settings.exclusions),
        preferences = or_none(&settings.preferences),
        targets = targets.prompt_lines(),
        hint = variety_hint,
        structure = structure_block(version),
    )
}
