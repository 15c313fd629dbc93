// src/utils/html.rs

/// Sanitizes admin-authored text (question text, options, descriptions) before it is stored.
///
/// Uses ammonia's whitelist: harmless formatting such as `<b>` survives, while `<script>`
/// (including its content), `<iframe>` and event-handler attributes are removed. The
/// browser client injects these strings as HTML, so this is the stored-XSS guard.
pub fn clean_html(input: &str) -> String {
    ammonia::clean(input)
}
