use serde_json::{json, Value};

use super::dto::SchemaVersion;

fn macro_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "calories": { "type": "NUMBER" },
            "protein": { "type": "NUMBER" },
            "carbs": { "type": "NUMBER" },
            "fat": { "type": "NUMBER" }
        },
        "required": ["calories", "protein", "carbs", "fat"]
    })
}

fn meal_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "type": { "type": "STRING" },
            "title": { "type": "STRING" },
            "description": { "type": "STRING" },
            "prepTime": { "type": "STRING" },
            "macros": macro_schema(),
            "ingredients": { "type": "ARRAY", "items": { "type": "STRING" } },
            "instructions": { "type": "ARRAY", "items": { "type": "STRING" } }
        },
        "required": [
            "type",
            "title",
            "description",
            "prepTime",
            "macros",
            "ingredients",
            "instructions"
        ]
    })
}

/// Output-shape contract declared to the model for the given version.
pub fn response_schema(version: SchemaVersion) -> Value {
    match version {
        SchemaVersion::Flat => json!({
            "type": "OBJECT",
            "properties": {
                "summary": macro_schema(),
                "meals": { "type": "ARRAY", "items": meal_schema() }
            },
            "required": ["summary", "meals"]
        }),
        SchemaVersion::Slotted => json!({
            "type": "OBJECT",
            "properties": {
                "slots": {
                    "type": "ARRAY",
                    "items": {
                        "type": "OBJECT",
                        "properties": {
                            "title": { "type": "STRING" },
                            "options": { "type": "ARRAY", "items": meal_schema() }
                        },
                        "required": ["title", "options"]
                    }
                }
            },
            "required": ["slots"]
        }),
    }
}

#[cfg(test)]
mod schema_tests {
    use super::*;

    #[test]
    fn flat_schema_requires_summary_and_meals() {
        let s = response_schema(SchemaVersion::Flat);
        assert_eq!(s["required"], json!(["summary", "meals"]));
        assert_eq!(s["properties"]["meals"]["items"]["properties"]["prepTime"]["type"], "STRING");
    }

    #[test]
    fn slotted_schema_nests_meals_in_options() {
        let s = response_schema(SchemaVersion::Slotted);
        let options = &s["properties"]["slots"]["items"]["properties"]["options"];
        assert_eq!(options["type"], "ARRAY");
        assert_eq!(
            options["items"]["properties"]["macros"]["required"],
            json!(["calories", "protein", "carbs", "fat"])
        );
    }
}
