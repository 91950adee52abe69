/// Lowercase ASCII slug: alphanumerics kept, every other run collapsed to `-`.
pub fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    let mut pending_dash = false;

    for ch in input.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(ch.to_ascii_lowercase());
        } else if ch == '\'' {
            // "St Mary's" -> "st-marys"
        } else {
            pending_dash = true;
        }
    }

    slug
}

/// Slug for a venue, made unique by the caller with [`with_suffix`].
pub fn venue_slug(name: &str, suburb: &str) -> String {
    slugify(&format!("{name} {suburb}"))
}

pub fn with_suffix(base: &str, n: u32) -> String {
    if n <= 1 {
        base.to_string()
    } else {
        format!("{base}-{n}")
    }
}
