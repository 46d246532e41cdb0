// src/prompt/compose.rs
// Join ordered section builders into one instruction text

pub const SECTION_SEPARATOR: &str = "\n\n";

/// Evaluate each section in order, drop the empty ones, join the rest.
///
/// Sections are trimmed so a builder's trailing newlines never stack up
/// with the separator.
pub fn compose<I, F>(sections: I) -> String
where
    I: IntoIterator<Item = F>,
    F: FnOnce() -> String,
{
    sections
        .into_iter()
        .map(|section| section())
        .filter_map(|text| {
            let text = text.trim();
            (!text.is_empty()).then(|| text.to_string())
        })
        .collect::<Vec<_>>()
        .join(SECTION_SEPARATOR)
}
