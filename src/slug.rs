/// Derives a URL-safe identifier from a human-readable title.
///
/// Lowercases ASCII alphanumerics, drops punctuation, and collapses
/// whitespace (and existing `-`/`_` separator runs) into single hyphens.
/// Deterministic: the same title always yields the same slug. Global
/// uniqueness is enforced by the storage layer (unique index on
/// `products.slug`), not here; a collision surfaces as a write conflict.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    // Starts true to suppress leading separators.
    let mut prev_hyphen = true;
    for ch in title.chars() {
        if ch.is_ascii_alphanumeric() {
            slug.push(ch.to_ascii_lowercase());
            prev_hyphen = false;
        } else if (ch.is_whitespace() || ch == '-' || ch == '_') && !prev_hyphen {
            slug.push('-');
            prev_hyphen = true;
        }
        // Any other punctuation is dropped entirely.
    }
    if slug.ends_with('-') {
        slug.pop();
    }
    slug
}
