//! Display names for operations exposed under code identifiers

/// Convert a `snake_case` identifier to Title Case
///
/// Each underscore-separated word gets an upper-case first character and a
/// lower-case remainder; words are joined with a single space.
///
/// ```
/// assert_eq!(vision_ops::title_case("face_detection"), "Face Detection");
/// ```
pub fn title_case(ident: &str) -> String {
    ident
        .split('_')
        .map(capitalize)
        .collect::<Vec<_>>()
        .join(" ")
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

/// Identifiers with a leading double underscore are private to the provider
pub fn is_private_ident(ident: &str) -> bool {
    ident.starts_with("__")
}
