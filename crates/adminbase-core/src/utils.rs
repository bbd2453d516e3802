//! Small shared helpers

/// Turns a raw column name into a display label.
///
/// `"id"` becomes `"ID"`; otherwise underscores and dashes split words and
/// every word is capitalized: `"created_at"` -> `"Created At"`.
pub fn humanize_column_name(name: &str) -> String {
    if name.eq_ignore_ascii_case("id") {
        return "ID".to_string();
    }

    name.split(|c| c == '_' || c == '-')
        .filter(|w| !w.is_empty())
        .map(capitalize)
        .collect::<Vec<_>>()
        .join(" ")
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}
