use std::sync::OnceLock;

fn strip_all() -> &'static ammonia::Builder<'static> {
    static BUILDER: OnceLock<ammonia::Builder<'static>> = OnceLock::new();
    BUILDER.get_or_init(|| {
        let mut builder = ammonia::Builder::empty();
        builder.clean_content_tags(["script", "style"].into_iter().collect());
        builder
    })
}

/// Strip every HTML tag from user-supplied text and trim it. User content is
/// rendered as plain text, so nothing markup-like is kept.
pub fn sanitize_plain(input: &str) -> String {
    strip_all().clean(input).to_string().trim().to_string()
}

/// Sanitized value, or `None` when nothing is left.
pub fn sanitize_optional(input: Option<&str>) -> Option<String> {
    input.map(sanitize_plain).filter(|s| !s.is_empty())
}
