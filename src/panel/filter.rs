//! Client-side list filtering: free-text search, categorical filter, sorting

use crate::resource::extract_json_value;
use serde_json::Value;
use std::cmp::Ordering;

/// Categorical filter value that lets everything through
pub const ALL_CATEGORIES: &str = "all";

/// Case-insensitive substring match of `search` against any of `fields`.
/// A blank search matches everything.
pub fn matches_search(row: &Value, fields: &[String], search: &str) -> bool {
    let needle = search.trim().to_lowercase();
    if needle.is_empty() {
        return true;
    }

    fields
        .iter()
        .any(|field| extract_json_value(row, field).to_lowercase().contains(&needle))
}

/// Exact match, or everything for [`ALL_CATEGORIES`]
pub fn matches_category(value: &str, category: &str) -> bool {
    category == ALL_CATEGORIES || value == category
}

/// Filter options: `all`, then the presets, then every observed value, de-duplicated
pub fn category_options<'a>(
    presets: &'a [String],
    observed: impl IntoIterator<Item = &'a str>,
) -> Vec<String> {
    let mut options = vec![ALL_CATEGORIES.to_string()];

    let candidates = presets.iter().map(String::as_str).chain(observed);
    for candidate in candidates {
        if !candidate.is_empty() && !options.iter().any(|o| o == candidate) {
            options.push(candidate.to_string());
        }
    }

    options
}

/// Compare two rows on a column, numerically when both sides parse as numbers
pub fn compare_rows(a: &Value, b: &Value, json_path: &str) -> Ordering {
    let val_a = extract_json_value(a, json_path);
    let val_b = extract_json_value(b, json_path);

    match (val_a.parse::<f64>(), val_b.parse::<f64>()) {
        (Ok(na), Ok(nb)) => na.partial_cmp(&nb).unwrap_or(Ordering::Equal),
        _ => val_a.to_lowercase().cmp(&val_b.to_lowercase()),
    }
}
