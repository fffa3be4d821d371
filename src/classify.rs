pub const KEYWORD: &str = "ambulance";

/// Joins OCR fragments in engine order with single spaces and lowercases them.
pub fn extracted_text<S: AsRef<str>>(fragments: &[S]) -> String {
    fragments
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Plain substring containment; "ambulances" and "xambulancex" match too.
pub fn contains_keyword(text: &str) -> bool {
    text.to_lowercase().contains(KEYWORD)
}
