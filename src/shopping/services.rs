use std::collections::BTreeSet;

use crate::config::CLINIC_NAME;
use crate::plans::dto::Meal;

/// Plain-text form for pasting into notes or messages.
pub fn clipboard_text(items: &[String]) -> String {
    format!("{} - Shopping List:\n\n{}", CLINIC_NAME, items.join("\n"))
}

/// Every ingredient across `meals`, trimmed, exact-match deduplicated and
/// sorted. Blank entries are dropped.
pub fn shopping_list<'a>(meals: impl IntoIterator<Item = &'a Meal>) -> Vec<String> {
    meals
        .into_iter()
        .flat_map(|m| m.ingredients.iter())
        .map(|i| i.trim())
        .filter(|i| !i.is_empty())
        .map(str::to_string)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
