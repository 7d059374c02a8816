use serde_json::Value;

/// Title used when no probed field yields text.
pub const PLACEHOLDER_TITLE: &str = "No Title";

/// Top-level `data` fields probed before `content[0].text`.
const LEADING_FIELDS: [&str; 3] = ["title", "page_title", "hero_title"];
const TRAILING_FIELD: &str = "name";

/// Derive the display title the migration API requires.
///
/// Probes `data.title`, `data.page_title`, `data.hero_title`,
/// `data.content[0].text` and `data.name`, in that order. A field counts when
/// it is a non-blank string, or a rich-text block list with a non-blank
/// `text` somewhere in it.
pub fn synthesize_title(data: &Value) -> String {
    LEADING_FIELDS
        .iter()
        .filter_map(|field| data.get(*field))
        .chain(data.pointer("/content/0/text"))
        .chain(data.get(TRAILING_FIELD))
        .find_map(title_text)
        .unwrap_or_else(|| PLACEHOLDER_TITLE.to_string())
}

fn title_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) if !text.trim().is_empty() => Some(text.clone()),
        Value::Array(blocks) => blocks
            .iter()
            .filter_map(|block| block.get("text").and_then(Value::as_str))
            .find(|text| !text.trim().is_empty())
            .map(str::to_string),
        _ => None,
    }
}
