// src/utils/html.rs

/// Sanitises admin-authored rich text (course descriptions, question text).
///
/// Whitelist-based: formatting tags such as `<b>` and `<p>` survive, while
/// `<script>`, `<iframe>` and event-handler attributes are removed.
pub fn clean_html(input: &str) -> String {
    ammonia::clean(input)
}
