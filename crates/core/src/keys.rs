//! Title normalization: navigable slugs and cache keys.
//!
//! Both functions are pure; the same raw input always yields the same
//! output.

/// Punctuation replaced by `-` when building a navigable slug.
const SLUG_PUNCTUATION: &[char] = &['&', '(', ')', '\u{2018}', '\u{2019}', '\'', ',', '.', '+', ':'];

/// Cache key kind for drama entities.
pub const DRAMA_KIND: &str = "drama";

/// Turn a free-text title into a stable navigable slug.
///
/// Whitespace and a fixed punctuation set are each replaced with `-`.
/// No collapsing is applied; consecutive replaced characters produce
/// consecutive dashes, matching the canonical page addresses.
pub fn slugify(title: &str) -> String {
    title
        .chars()
        .map(|c| {
            if c.is_whitespace() || SLUG_PUNCTUATION.contains(&c) {
                '-'
            } else {
                c
            }
        })
        .collect()
}

/// Build a normalized `{kind}/{name}` cache key.
///
/// Each segment maps characters outside `[A-Za-z0-9_.-]` to `_`,
/// collapses repeated underscores, trims leading/trailing underscores,
/// and lower-cases. An empty name segment falls back to the literal
/// `unknown`.
pub fn cache_key(kind: &str, name: &str) -> String {
    let kind = normalize_segment(kind);
    let name = normalize_segment(name);
    let name = if name.is_empty() {
        "unknown".to_string()
    } else {
        name
    };
    format!("{kind}/{name}")
}

/// Cache key for a single drama entity.
pub fn entity_key(name: &str) -> String {
    cache_key(DRAMA_KIND, name)
}

/// Cache key for the drama list.
pub fn list_key() -> String {
    cache_key(DRAMA_KIND, "index")
}

fn normalize_segment(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut last_was_separator = false;

    for c in raw.trim().chars() {
        let mapped = if c.is_ascii_alphanumeric() || c == '.' || c == '-' {
            c.to_ascii_lowercase()
        } else {
            '_'
        };

        if mapped == '_' {
            if !last_was_separator {
                out.push('_');
            }
            last_was_separator = true;
        } else {
            out.push(mapped);
            last_was_separator = false;
        }
    }

    out.trim_matches('_').to_string()
}
